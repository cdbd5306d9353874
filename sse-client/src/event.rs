//! Event type delivered to listeners.

use std::fmt;

/// Event type used when the stream does not name one.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A single dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Last event id seen on the stream, if any
    pub id: Option<String>,
    /// Event type tag (`message` unless the stream set one)
    pub event_type: String,
    /// Event payload, with multiple data lines joined by `\n`
    pub data: String,
}

impl SseEvent {
    /// Create an event with the given type and payload and no id.
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: None,
            event_type: event_type.into(),
            data: data.into(),
        }
    }

    /// Attach an id to the event.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl fmt::Display for SseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}#{} ({} bytes)", self.event_type, id, self.data.len()),
            None => write!(f, "{} ({} bytes)", self.event_type, self.data.len()),
        }
    }
}
