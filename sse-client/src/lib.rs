//! # sse-client
//!
//! A small server-sent events client built around listener callbacks.
//!
//! Each call to [`EventSourceFactory::open`] starts one session: a streaming
//! GET request whose body is parsed incrementally and delivered to an
//! [`EventSourceListener`]. The client never reconnects by itself; a caller
//! that wants a long-lived subscription watches for the terminal callback
//! (`on_closed` or `on_failure`) and opens a new session.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sse_client::{ClientConfig, EventSourceFactory, HttpEventSourceFactory, SseRequest};
//!
//! let request = SseRequest::new("https://stream.example.org/v2/stream/recentchange")?;
//! let factory = HttpEventSourceFactory::new(&ClientConfig::default(), &request)?;
//! let handle = factory.open(runtime.handle(), Arc::new(MyListener))?;
//! // ...
//! handle.cancel();
//! ```

mod config;
mod error;
mod event;
mod event_source;
mod listener;
pub mod parser;

pub use config::{ClientConfig, SseRequest, EVENT_STREAM_MEDIA_TYPE};
pub use error::{has_graceful_reset, Result, SseError};
pub use event::{SseEvent, DEFAULT_EVENT_TYPE};
pub use event_source::{
    EventSourceFactory, EventSourceHandle, HttpEventSource, HttpEventSourceFactory,
};
pub use listener::{EventSourceListener, SessionInfo};
pub use parser::{EventStreamParser, DEFAULT_MAX_EVENT_SIZE};
