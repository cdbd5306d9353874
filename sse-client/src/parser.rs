//! Incremental `text/event-stream` parser.
//!
//! Bytes are fed in whatever chunks the network delivers; complete events are
//! returned as soon as their terminating blank line has been seen. Line endings
//! may be `\n`, `\r\n` or `\r`, including a `\r\n` pair split across two chunks.
//!
//! Buffered input is bounded: an event (or a single unterminated line) larger
//! than the configured maximum is an error rather than unbounded growth.

use std::time::Duration;

use crate::error::{Result, SseError};
use crate::event::{SseEvent, DEFAULT_EVENT_TYPE};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Default upper bound on the buffered size of one event, in bytes.
///
/// Matches the largest record a Kinesis data stream accepts.
pub const DEFAULT_MAX_EVENT_SIZE: usize = 1024 * 1024;

/// Stateful parser for one event stream.
#[derive(Debug)]
pub struct EventStreamParser {
    max_event_size: usize,
    line: Vec<u8>,
    pending_cr: bool,
    seen_first_line: bool,
    event_type: Option<String>,
    data: String,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl Default for EventStreamParser {
    fn default() -> Self {
        Self::with_max_event_size(DEFAULT_MAX_EVENT_SIZE)
    }
}

impl EventStreamParser {
    /// Create a parser positioned at the start of a stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser that rejects events larger than `max_event_size` bytes.
    pub fn with_max_event_size(max_event_size: usize) -> Self {
        Self {
            max_event_size,
            line: Vec::new(),
            pending_cr: false,
            seen_first_line: false,
            event_type: None,
            data: String::new(),
            last_event_id: None,
            retry: None,
        }
    }

    /// Feed a chunk of bytes, returning every event it completed.
    ///
    /// Fails with [`SseError::EventTooLarge`] once the event being assembled
    /// outgrows the limit. Buffered input is discarded at that point, along
    /// with any events completed earlier in the same chunk; the stream is not
    /// expected to be read further.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>> {
        let mut events = Vec::new();

        for &byte in chunk {
            match byte {
                b'\n' if self.pending_cr => {
                    // second half of a CRLF already handled on the CR
                    self.pending_cr = false;
                }
                b'\r' | b'\n' => {
                    self.pending_cr = byte == b'\r';
                    let line = std::mem::take(&mut self.line);
                    if let Some(event) = self.process_line(&line) {
                        events.push(event);
                    }
                }
                _ => {
                    self.pending_cr = false;
                    self.line.push(byte);
                }
            }

            if self.line.len() + self.data.len() > self.max_event_size {
                self.line = Vec::new();
                self.data = String::new();
                self.event_type = None;
                return Err(SseError::EventTooLarge(self.max_event_size));
            }
        }

        Ok(events)
    }

    pub fn max_event_size(&self) -> usize {
        self.max_event_size
    }

    /// The most recent event id, persisting across events.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// The reconnection time most recently advertised by the server.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<SseEvent> {
        let mut raw = raw;
        if !self.seen_first_line {
            self.seen_first_line = true;
            raw = raw.strip_prefix(BOM).unwrap_or(raw);
        }

        if raw.is_empty() {
            return self.dispatch();
        }

        let line = String::from_utf8_lossy(raw);
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(idx) => {
                let value = &line[idx + 1..];
                (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line.as_ref(), ""),
        };

        match field {
            "event" => self.event_type = Some(value.to_string()),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = if value.is_empty() {
                        None
                    } else {
                        Some(value.to_string())
                    };
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            _ => {}
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = self.event_type.take();
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }

        Some(SseEvent {
            id: self.last_event_id.clone(),
            event_type: event_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            data,
        })
    }
}
