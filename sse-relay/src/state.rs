//! State shared between the supervisor thread and transport callbacks.
//!
//! `running` has a single writer (shutdown). Each session gets its own
//! [`SessionSignal`], so a listener left over from a torn-down session can
//! never clear the flag of its successor.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

/// Lifecycle of one session as seen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Session opened by the supervisor, endpoint not yet confirmed
    Connecting = 0,
    /// Endpoint accepted the request and the body is streaming
    Connected = 1,
    /// Session ended; the supervisor must tear it down and reconnect
    Disconnected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Per-session connected/disconnected signal.
///
/// Transitions and their only writers:
/// - created as `Connecting` by the supervisor before the session is opened
/// - `Connecting -> Connected` by the open callback
/// - `* -> Disconnected` by the closed and failure callbacks
#[derive(Debug)]
pub struct SessionSignal {
    state: AtomicU8,
    opened: AtomicBool,
}

impl Default for SessionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSignal {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            opened: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Move to `Connected`. Returns false if the session already ended.
    pub fn mark_open(&self) -> bool {
        let moved = self
            .state
            .compare_exchange(
                ConnectionState::Connecting as u8,
                ConnectionState::Connected as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if moved {
            self.opened.store(true, Ordering::SeqCst);
        }
        moved
    }

    /// Move to `Disconnected`, returning the state it replaced.
    pub fn mark_disconnected(&self) -> ConnectionState {
        ConnectionState::from_u8(
            self.state
                .swap(ConnectionState::Disconnected as u8, Ordering::SeqCst),
        )
    }

    /// Whether the supervisor should keep waiting on this session.
    pub fn is_live(&self) -> bool {
        self.state() != ConnectionState::Disconnected
    }

    /// Whether the endpoint ever confirmed this session.
    pub fn was_opened(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }
}

/// Counters and the running flag for the lifetime of a relay.
#[derive(Debug)]
pub struct RuntimeState {
    running: AtomicBool,
    messages_received: AtomicU64,
    sessions_opened: AtomicU64,
    events_accepted: AtomicU64,
    records_published: AtomicU64,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            messages_received: AtomicU64::new(0),
            sessions_opened: AtomicU64::new(0),
            events_accepted: AtomicU64::new(0),
            records_published: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the running flag. Returns whether it was set.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }

    /// Accepted events counted since the last reconnect or report.
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::SeqCst)
    }

    pub(crate) fn messages_received_counter(&self) -> &AtomicU64 {
        &self.messages_received
    }

    pub(crate) fn count_message(&self) {
        self.messages_received.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn reset_messages_received(&self) {
        self.messages_received.store(0, Ordering::SeqCst);
    }

    pub(crate) fn record_session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_accepted(&self) {
        self.events_accepted.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_published(&self) {
        self.records_published.fetch_add(1, Ordering::SeqCst);
    }

    /// Snapshot of the lifetime counters.
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            sessions_opened: self.sessions_opened.load(Ordering::SeqCst),
            events_accepted: self.events_accepted.load(Ordering::SeqCst),
            records_published: self.records_published.load(Ordering::SeqCst),
        }
    }
}

/// Lifetime counters of a relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Sessions opened by the supervisor
    pub sessions_opened: u64,
    /// Events that passed the type filter
    pub events_accepted: u64,
    /// Records the durable stream accepted
    pub records_published: u64,
}
