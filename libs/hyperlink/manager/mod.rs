//! Connection supervisor
//!
//! Manages one logical connection per label with automatic transport
//! selection, reconnection, send buffering and edge-triggered events.

pub mod builder;
pub mod supervisor;

pub use builder::SupervisorBuilder;
pub use supervisor::ConnectionSupervisor;
