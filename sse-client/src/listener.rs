//! Callback surface invoked by an event source.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::SseError;
use crate::event::SseEvent;

/// Details about an established session, passed to [`EventSourceListener::on_open`].
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Unique id of this session, also used in log lines
    pub session_id: Uuid,
    /// The URL that was opened
    pub url: String,
    /// HTTP status of the accepted response
    pub status: u16,
}

/// Receives the lifecycle of one event-stream session.
///
/// Callbacks for a given session are never concurrent: each one is awaited
/// before the transport reads more data. Every session ends with exactly one
/// terminal callback, either `on_closed` or `on_failure`.
#[async_trait]
pub trait EventSourceListener: Send + Sync {
    /// The endpoint accepted the request and the body is about to be read.
    async fn on_open(&self, _session: &SessionInfo) {}

    /// A complete event was parsed from the stream.
    async fn on_event(&self, event: SseEvent);

    /// The stream ended normally or the session was cancelled.
    async fn on_closed(&self) {}

    /// The session failed to open or broke mid-stream.
    async fn on_failure(&self, _error: &SseError) {}
}
