//! HyperLink Realtime - Main Library
//!
//! Host-side crate for the HyperLink connection supervisor.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, logging, shutdown)
//! - **hyperlink**: Connection supervisor library (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use hyperlink_realtime::bin_common::{load_config_from_env, ConfigType};
//! use hyperlink_realtime::hyperlink::ConnectionSupervisor;
//! ```

// Re-export workspace libraries for convenience
pub use hyperlink;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod logging;
    pub mod shutdown;

    pub use cli::{load_config_from_env, parse_args, parse_endpoint, ConfigType, EndpointArg};
    pub use logging::init_tracing;
    pub use shutdown::ShutdownManager;
}
