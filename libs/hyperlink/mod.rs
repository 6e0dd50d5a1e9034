//! # HyperLink
//!
//! A multiplexed real-time connection supervisor. Each caller-chosen label
//! binds to one endpoint and keeps a live data channel to it, either by
//! polling over HTTP or through a persistent WebSocket.
//!
//! ## Features
//!
//! - **Automatic transport selection**: `ws://`/`wss://` URLs get a socket, others are polled
//! - **Reconnection policy**: fixed-delay retries or halt-on-error, per label
//! - **Send buffering**: outbound messages wait in order for a ready socket
//! - **Edge-triggered events**: duplicate occurrences collapse until the host samples them
//! - **Epoch-guarded transports**: late results from a replaced transport are discarded

pub mod traits;
pub mod core;
pub mod manager;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    config, connection_state, events, mode, poll, registry, send_buffer, socket, transport,
    config::{ConfigError, SupervisorConfig},
    connection_state::{ConnectionState, LabelStatus, Phase},
    events::{EventEdgeQueue, EventKind},
    mode::{ConnectionMode, ErrorMode, ResolvedMode, TransportKind},
    poll::{CacheBuster, HttpPollSource},
    registry::{EndpointConfig, EndpointRegistry, Label},
    send_buffer::SendBuffer,
};

// Re-export manager
pub use manager::{builder, supervisor, ConnectionSupervisor, SupervisorBuilder};
