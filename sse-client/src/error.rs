//! Error types for the sse-client crate.

use std::error::Error as StdError;
use std::time::Duration;

/// Errors raised while opening or reading an event stream.
#[derive(Debug, thiserror::Error)]
pub enum SseError {
    /// The request could not be built (bad URL or header)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The connection could not be established
    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Unexpected HTTP status {status}: {reason}")]
    Status {
        /// Numeric status code
        status: u16,
        /// Canonical reason phrase, if known
        reason: String,
    },

    /// The endpoint answered with something other than `text/event-stream`
    #[error("Unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// Reading the response body failed mid-stream
    #[error("Stream read failed: {0}")]
    Stream(#[source] reqwest::Error),

    /// No bytes arrived within the configured read timeout
    #[error("No data received within {0:?}")]
    ReadTimeout(Duration),

    /// An event grew past the configured maximum size
    #[error("Event exceeds the maximum size of {0} bytes")]
    EventTooLarge(usize),
}

impl SseError {
    /// Whether this failure is an HTTP/2 stream reset carrying the `NO_ERROR` code.
    ///
    /// Servers use this to end a long-lived stream without signalling a fault, so
    /// callers usually log it quietly before reconnecting.
    pub fn is_graceful_reset(&self) -> bool {
        match self {
            // reqwest's own message carries the request URL; only its causes are inspected
            SseError::Connect(e) | SseError::Stream(e) => {
                e.source().is_some_and(has_graceful_reset)
            }
            _ => false,
        }
    }
}

/// How h2 describes the `NO_ERROR` reason code in its display form.
const NO_ERROR_REASON: &str = "not a result of an error";

/// Walk an error's source chain looking for an HTTP/2 `NO_ERROR` reset.
///
/// Only the display text of each link is matched against h2's reason phrase.
pub fn has_graceful_reset(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if e.to_string().contains(NO_ERROR_REASON) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Convenience type alias for Results using SseError.
pub type Result<T> = std::result::Result<T, SseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Reset(&'static str);

    impl fmt::Display for Reset {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "stream error received: {}", self.0)
        }
    }

    impl StdError for Reset {}

    /// Stands in for a client error that names the request URL.
    #[derive(Debug)]
    struct Wrapper {
        url: &'static str,
        cause: Reset,
    }

    impl Wrapper {
        fn new(cause: &'static str) -> Self {
            Self {
                url: "https://stream.example.org/v2/stream/recentchange",
                cause: Reset(cause),
            }
        }
    }

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error reading a body from connection for url ({})", self.url)
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.cause)
        }
    }

    #[test]
    fn test_graceful_reset_found_in_source_chain() {
        let err = Wrapper::new("not a result of an error");
        assert!(has_graceful_reset(&err));
    }

    #[test]
    fn test_other_resets_are_not_graceful() {
        let err = Wrapper::new("stream no longer needed");
        assert!(!has_graceful_reset(&err));
    }

    #[test]
    fn test_reason_code_in_url_is_not_a_graceful_reset() {
        let err = Wrapper {
            url: "https://stream.example.org/events?reason=NO_ERROR",
            cause: Reset("connection reset by peer"),
        };
        assert!(format!("{err:?}").contains("NO_ERROR"));
        assert!(!has_graceful_reset(&err));
    }

    #[test]
    fn test_error_display() {
        let error = SseError::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unexpected HTTP status 503: Service Unavailable"
        );

        let error = SseError::ReadTimeout(Duration::from_millis(1500));
        assert_eq!(error.to_string(), "No data received within 1.5s");

        let error = SseError::UnexpectedContentType("text/html".to_string());
        assert_eq!(error.to_string(), "Unexpected content type: text/html");
        assert!(!error.is_graceful_reset());
    }
}
