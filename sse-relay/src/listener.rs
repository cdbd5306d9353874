//! Listener wiring one transport session to the router and publisher.

use std::sync::Arc;

use async_trait::async_trait;
use sse_client::{EventSourceListener, SessionInfo, SseError, SseEvent};
use stream_publisher::StreamPublisher;

use crate::router::EventRouter;
use crate::state::{ConnectionState, RuntimeState, SessionSignal};

/// Per-session listener.
///
/// Every session gets its own [`SessionSignal`], so callbacks arriving
/// late from a session the supervisor already gave up on can't flip the
/// connection state of its successor.
pub struct RelayListener {
    router: Arc<EventRouter>,
    publisher: Arc<StreamPublisher>,
    stream_name: String,
    signal: Arc<SessionSignal>,
    state: Arc<RuntimeState>,
}

impl RelayListener {
    pub fn new(
        router: Arc<EventRouter>,
        publisher: Arc<StreamPublisher>,
        stream_name: impl Into<String>,
        signal: Arc<SessionSignal>,
        state: Arc<RuntimeState>,
    ) -> Self {
        Self {
            router,
            publisher,
            stream_name: stream_name.into(),
            signal,
            state,
        }
    }

    fn disconnect(&self) {
        if self.signal.mark_disconnected() == ConnectionState::Disconnected {
            tracing::debug!("Terminal callback for a session already marked disconnected");
        }
    }
}

#[async_trait]
impl EventSourceListener for RelayListener {
    async fn on_open(&self, session: &SessionInfo) {
        if self.signal.mark_open() {
            tracing::info!(
                session = %session.session_id,
                "Connected to SSE endpoint {}",
                session.url
            );
        }
    }

    async fn on_event(&self, event: SseEvent) {
        if !self.signal.is_live() {
            return;
        }

        if !self.router.route(&event.event_type) {
            return;
        }

        if self
            .publisher
            .publish(&event.data, &event.event_type, &self.stream_name)
            .await
        {
            self.state.record_published();
        }
    }

    async fn on_closed(&self) {
        tracing::info!("Closed");
        self.disconnect();
    }

    async fn on_failure(&self, error: &SseError) {
        if error.is_graceful_reset() {
            tracing::info!("Stream reset by server: {}", error);
        } else {
            tracing::error!(error = ?error, "Error on SSE stream: {}", error);
        }
        self.disconnect();
    }
}
