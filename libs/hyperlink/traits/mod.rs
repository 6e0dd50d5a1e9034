//! # HyperLink Traits
//!
//! Seams between the connection supervisor and the outside world:
//!
//! - **PollSource**: perform one read for the polling transport
//! - **HostNotifier**: wake the host so it re-samples state
//! - **ReconnectionStrategy**: control retry delays after failures
//! - **HyperLinkError**: the error type shared by all modules

pub mod error;
pub mod notifier;
pub mod poll_source;
pub mod reconnect;

// Re-export commonly used types
pub use error::{HyperLinkError, Result};
pub use notifier::{ChannelNotifier, FnNotifier, HostNotifier, NoopNotifier};
pub use poll_source::PollSource;
#[cfg(any(test, feature = "test-util"))]
pub use poll_source::{ScriptedPollSource, ScriptedResponse};
pub use reconnect::{strategy_for, FixedDelay, NeverReconnect, ReconnectionStrategy};
