//! Cooperative shutdown for a running relay.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::state::RuntimeState;

/// One-shot latch set when the supervisor loop has fully wound down.
#[derive(Debug, Default)]
pub(crate) struct TerminationLatch {
    done: Mutex<bool>,
    cond: Condvar,
}

impl TerminationLatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn signal(&self) {
        let mut done = self.done.lock();
        *done = true;
        self.cond.notify_all();
    }

    pub(crate) fn is_set(&self) -> bool {
        *self.done.lock()
    }

    /// Wait until the latch is set. Returns false on timeout.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut done = self.done.lock();
        while !*done {
            if self.cond.wait_until(&mut done, deadline).timed_out() {
                return *done;
            }
        }
        true
    }
}

/// Sets the latch when dropped, so early returns and panics out of the
/// supervisor still release waiters.
pub(crate) struct TerminationGuard(pub(crate) Arc<TerminationLatch>);

impl Drop for TerminationGuard {
    fn drop(&mut self) {
        self.0.signal();
    }
}

/// Cloneable handle used to stop a relay from another thread.
///
/// Typically moved into a Ctrl+C handler while `start()` blocks the main
/// thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    state: Arc<RuntimeState>,
    latch: Arc<TerminationLatch>,
}

impl ShutdownHandle {
    pub(crate) fn new(state: Arc<RuntimeState>, latch: Arc<TerminationLatch>) -> Self {
        Self { state, latch }
    }

    /// Request shutdown. Idempotent; does not wait.
    pub fn shutdown(&self) {
        if self.state.stop() {
            tracing::info!("Shutdown requested");
        }
    }

    /// Request shutdown and wait up to `timeout` for the relay to finish.
    ///
    /// Returns true if the relay stopped in time.
    pub fn shutdown_and_wait(&self, timeout: Duration) -> bool {
        self.shutdown();
        let stopped = self.latch.wait_timeout(timeout);
        if !stopped {
            tracing::warn!("Relay did not stop within {:?}", timeout);
        }
        stopped
    }

    /// Whether the relay has fully stopped.
    pub fn is_terminated(&self) -> bool {
        self.latch.is_set()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }
}
