//! Error types for the stream-publisher crate.

/// Errors returned by a [`DurableStream`](crate::DurableStream) backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    /// The service was reachable but failed the request
    #[error("Stream service error: {0}")]
    Service(String),

    /// The service rejected the request because of throughput limits
    #[error("Throughput exceeded: {0}")]
    Throttled(String),

    /// The request was refused (permissions, missing stream, bad input)
    #[error("Record rejected: {0}")]
    Rejected(String),

    /// The request never reached the service
    #[error("Publish failed: {0}")]
    Other(String),
}

/// Convenience type alias for Results using PublishError.
pub type Result<T> = std::result::Result<T, PublishError>;
