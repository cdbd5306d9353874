//! The reconnect loop.
//!
//! Runs on the thread that called [`SseRelay::start`](crate::SseRelay::start)
//! and owns exactly one transport session at a time. All coordination with
//! the transport goes through the session's [`SessionSignal`] and the shared
//! [`RuntimeState`].

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use sse_client::{EventSourceFactory, EventSourceHandle};
use stream_publisher::StreamPublisher;
use tokio::runtime::Handle;

use crate::listener::RelayListener;
use crate::reconnect::ReconnectPolicy;
use crate::reporter::MetricsReporter;
use crate::router::EventRouter;
use crate::state::{RuntimeState, SessionSignal};

/// How long teardown waits for a cancelled session task to finish.
const TEARDOWN_GRACE: Duration = Duration::from_secs(1);

pub(crate) struct ConnectionSupervisor {
    factory: Arc<dyn EventSourceFactory>,
    runtime: Handle,
    router: Arc<EventRouter>,
    publisher: Arc<StreamPublisher>,
    stream_name: String,
    state: Arc<RuntimeState>,
    reporter: MetricsReporter,
    policy: ReconnectPolicy,
    wait_quantum: Duration,
    consecutive_failures: u32,
}

impl ConnectionSupervisor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        factory: Arc<dyn EventSourceFactory>,
        runtime: Handle,
        router: Arc<EventRouter>,
        publisher: Arc<StreamPublisher>,
        stream_name: String,
        state: Arc<RuntimeState>,
        reporter: MetricsReporter,
        policy: ReconnectPolicy,
        wait_quantum: Duration,
    ) -> Self {
        Self {
            factory,
            runtime,
            router,
            publisher,
            stream_name,
            state,
            reporter,
            policy,
            wait_quantum,
            consecutive_failures: 0,
        }
    }

    /// Open sessions until shutdown is requested.
    pub(crate) fn run(&mut self) {
        while self.state.is_running() {
            let delay = self.policy.delay_for(self.consecutive_failures);
            if !delay.is_zero() {
                tracing::info!(
                    attempt = self.consecutive_failures + 1,
                    "Reconnecting in {:?}",
                    delay
                );
                if !self.sleep_while_running(delay) {
                    break;
                }
            }

            self.state.reset_messages_received();
            let signal = Arc::new(SessionSignal::new());
            let listener = Arc::new(RelayListener::new(
                Arc::clone(&self.router),
                Arc::clone(&self.publisher),
                self.stream_name.clone(),
                Arc::clone(&signal),
                Arc::clone(&self.state),
            ));

            let handle = match self.factory.open(&self.runtime, listener) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::error!(error = ?e, "Unable to open event source: {}", e);
                    self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                    thread::sleep(self.wait_quantum);
                    continue;
                }
            };

            self.state.record_session_opened();
            tracing::debug!(session = %handle.session_id(), "Event source started");

            self.wait_while_connected(&signal);

            handle.cancel();
            tracing::info!(session = %handle.session_id(), "Stopping event source");
            self.await_teardown(handle.as_ref());

            if signal.was_opened() {
                self.consecutive_failures = 0;
            } else {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            }
        }

        tracing::info!("Supervisor loop exited");
    }

    fn wait_while_connected(&mut self, signal: &SessionSignal) {
        self.reporter.reset_window();
        while self.state.is_running() && signal.is_live() {
            thread::sleep(self.wait_quantum);
            self.reporter.tick(self.state.messages_received_counter());
        }
    }

    /// Sleep for `total` in quanta. Returns false if shutdown interrupted it.
    fn sleep_while_running(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        while self.state.is_running() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(self.wait_quantum.min(deadline - now));
        }
        false
    }

    fn await_teardown(&self, handle: &dyn EventSourceHandle) {
        let deadline = Instant::now() + TEARDOWN_GRACE;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!(
                    session = %handle.session_id(),
                    "Event source still running after {:?}; continuing",
                    TEARDOWN_GRACE
                );
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }
}
