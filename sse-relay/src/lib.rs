//! # sse-relay
//!
//! Keeps a subscription to a server-sent events endpoint alive and forwards
//! the events that pass a type allow-list to a durable stream, one record per
//! event with the event type as partition key.
//!
//! Delivery is at most once: each accepted event gets one publish attempt
//! and failures are logged, not retried. The connection, on the other hand,
//! is kept up indefinitely. Whenever a session ends, by server
//! close, network error or read timeout, a new one is opened until
//! [`ShutdownHandle::shutdown`] is called.
//!
//! [`SseRelay::start`] blocks the calling thread and drives the reconnect
//! loop there; the HTTP transport runs on a tokio runtime owned by the relay.

mod config;
mod error;
mod listener;
mod reconnect;
mod relay;
mod reporter;
mod router;
mod shutdown;
mod state;
mod supervisor;

pub use config::{
    parse_header_list, parse_type_list, RelayConfig, DEFAULT_REPORT_INTERVAL, DEFAULT_WAIT_QUANTUM,
};
pub use error::{RelayError, Result};
pub use listener::RelayListener;
pub use reconnect::ReconnectPolicy;
pub use relay::SseRelay;
pub use reporter::{MetricsReporter, ThroughputReport};
pub use router::EventRouter;
pub use shutdown::ShutdownHandle;
pub use state::{ConnectionState, RelayStats, RuntimeState, SessionSignal};

// Re-exported so embedders can inject their own stream or transport
pub use sse_client;
pub use stream_publisher;
