use thiserror::Error;

/// Main error type for hyperlink
///
/// Transport errors never reach the caller of the supervisor's public
/// operations; they are surfaced as [`EventKind::Error`](crate::EventKind)
/// occurrences instead. The variants still carry enough detail to be logged.
#[derive(Error, Debug)]
pub enum HyperLinkError {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP response with a non-success status
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for HyperLinkError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        HyperLinkError::WebSocket(err.to_string())
    }
}

/// Result type for hyperlink operations
pub type Result<T> = std::result::Result<T, HyperLinkError>;
