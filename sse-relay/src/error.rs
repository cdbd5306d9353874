//! Error types for the sse-relay crate.

use sse_client::SseError;

/// Errors that stop the relay before or instead of relaying.
///
/// Transport and publish failures during operation are never surfaced here;
/// they are logged and resolved by reconnecting or dropping the event.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Required configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `start` was called on a relay that already ran
    #[error("Relay has already been started")]
    AlreadyStarted,

    /// The transport runtime could not be created
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// The event source could not be prepared
    #[error("Transport setup failed: {0}")]
    Transport(#[from] SseError),
}

/// Convenience type alias for Results using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;
