//! # HyperLink core
//!
//! Leaf components of the connection supervisor: the endpoint registry,
//! per-label state, send buffer, edge-triggered event queue, mode
//! resolution, configuration, and the two transports.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hyperlink::{ConnectionMode, ConnectionSupervisor, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> hyperlink::Result<()> {
//!     let supervisor = ConnectionSupervisor::new(SupervisorConfig::default())?;
//!
//!     supervisor.register("prices", "wss://feed.example.com/prices");
//!     supervisor.send("prices", r#"{"subscribe":"BTC"}"#);
//!
//!     loop {
//!         if supervisor.poll_message_received("prices") {
//!             println!("{}", supervisor.latest("prices"));
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(33)).await;
//!     }
//! }
//! ```

pub mod config;
pub mod connection_state;
pub mod events;
pub mod mode;
pub mod poll;
pub mod registry;
pub mod send_buffer;
pub mod socket;
pub mod transport;

// Re-export main types
pub use config::{ConfigError, SupervisorConfig};
pub use connection_state::{ConnectionState, LabelStatus, Phase};
pub use events::{EventEdgeQueue, EventKind};
pub use mode::{ConnectionMode, ErrorMode, ResolvedMode, TransportKind};
pub use poll::{cache_busted_url, CacheBuster, HttpPollSource};
pub use registry::{EndpointConfig, EndpointRegistry, Label};
pub use send_buffer::SendBuffer;

// Re-export traits for convenience
pub use crate::traits::*;
