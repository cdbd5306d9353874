//! Event source sessions driven on a tokio runtime.
//!
//! A session is one streaming GET request. It runs as a single task on the
//! runtime it was opened on, parses the body incrementally and invokes the
//! listener for each lifecycle step. Cancellation is cooperative: it is
//! observed while waiting on the network and between events, never while a
//! listener callback is running.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::config::{ClientConfig, SseRequest, EVENT_STREAM_MEDIA_TYPE};
use crate::error::{Result, SseError};
use crate::listener::{EventSourceListener, SessionInfo};
use crate::parser::EventStreamParser;

/// Handle to a running session.
pub trait EventSourceHandle: Send {
    /// Ask the session to stop. Idempotent.
    fn cancel(&self);

    /// Id of the session this handle controls.
    fn session_id(&self) -> Uuid;

    /// Whether the session task has run to completion.
    fn is_finished(&self) -> bool;
}

/// Opens sessions against a fixed endpoint.
pub trait EventSourceFactory: Send + Sync {
    /// Start a new session on `runtime`, reporting to `listener`.
    fn open(
        &self,
        runtime: &Handle,
        listener: Arc<dyn EventSourceListener>,
    ) -> Result<Box<dyn EventSourceHandle>>;
}

/// reqwest-backed [`EventSourceFactory`].
pub struct HttpEventSourceFactory {
    client: reqwest::Client,
    url: Url,
    headers: HeaderMap,
    read_timeout: Duration,
    max_event_size: usize,
}

impl HttpEventSourceFactory {
    /// Build a factory for `request` using `config`.
    ///
    /// Header validation happens here so that a bad header is reported once
    /// instead of on every session.
    pub fn new(config: &ClientConfig, request: &SseRequest) -> Result<Self> {
        let headers = request.header_map()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(SseError::ClientBuild)?;

        Ok(Self {
            client,
            url: request.url().clone(),
            headers,
            read_timeout: config.read_timeout,
            max_event_size: config.max_event_size,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl EventSourceFactory for HttpEventSourceFactory {
    fn open(
        &self,
        runtime: &Handle,
        listener: Arc<dyn EventSourceListener>,
    ) -> Result<Box<dyn EventSourceHandle>> {
        let session_id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let request = self.client.get(self.url.clone()).headers(self.headers.clone());
        tracing::info!(
            session = %session_id,
            "Request created: GET {} ({} headers)",
            self.url,
            self.headers.len()
        );

        let session = Session {
            session_id,
            url: self.url.to_string(),
            read_timeout: self.read_timeout,
            max_event_size: self.max_event_size,
            listener,
            cancel: cancel_rx,
        };
        let task = runtime.spawn(session.run(request));

        Ok(Box::new(HttpEventSource {
            session_id,
            cancel_tx,
            task,
        }))
    }
}

/// Handle to a session opened by [`HttpEventSourceFactory`].
///
/// Dropping the handle cancels the session.
pub struct HttpEventSource {
    session_id: Uuid,
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl EventSourceHandle for HttpEventSource {
    fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    fn session_id(&self) -> Uuid {
        self.session_id
    }

    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Outcome of racing a network wait against cancellation.
enum Step<T> {
    Cancelled,
    Ready(T),
}

struct Session {
    session_id: Uuid,
    url: String,
    read_timeout: Duration,
    max_event_size: usize,
    listener: Arc<dyn EventSourceListener>,
    cancel: watch::Receiver<bool>,
}

impl Session {
    async fn run(mut self, request: reqwest::RequestBuilder) {
        let sent = tokio::select! {
            biased;
            _ = cancelled(&mut self.cancel) => Step::Cancelled,
            result = request.send() => Step::Ready(result),
        };

        let mut response = match sent {
            Step::Cancelled => return self.close("cancelled before connect").await,
            Step::Ready(Ok(response)) => response,
            Step::Ready(Err(e)) => return self.fail(SseError::Connect(e)).await,
        };

        let status = response.status();
        if !status.is_success() {
            let error = SseError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            return self.fail(error).await;
        }

        if let Some(content_type) = unexpected_content_type(response.headers()) {
            return self.fail(SseError::UnexpectedContentType(content_type)).await;
        }

        let info = SessionInfo {
            session_id: self.session_id,
            url: self.url.clone(),
            status: status.as_u16(),
        };
        self.listener.on_open(&info).await;

        let mut parser = EventStreamParser::with_max_event_size(self.max_event_size);
        loop {
            let read_timeout = self.read_timeout;
            let step = tokio::select! {
                biased;
                _ = cancelled(&mut self.cancel) => Step::Cancelled,
                chunk = read_chunk(&mut response, read_timeout) => Step::Ready(chunk),
            };

            match step {
                Step::Cancelled => return self.close("cancelled").await,
                Step::Ready(Ok(Some(chunk))) => {
                    let events = match parser.feed(&chunk) {
                        Ok(events) => events,
                        Err(e) => return self.fail(e).await,
                    };
                    for event in events {
                        if *self.cancel.borrow() {
                            return self.close("cancelled").await;
                        }
                        tracing::trace!(session = %self.session_id, "Dispatching event {}", event);
                        self.listener.on_event(event).await;
                    }
                }
                Step::Ready(Ok(None)) => return self.close("end of stream").await,
                Step::Ready(Err(e)) => return self.fail(e).await,
            }
        }
    }

    async fn close(&self, reason: &str) {
        tracing::debug!(session = %self.session_id, "Session closed: {}", reason);
        self.listener.on_closed().await;
    }

    async fn fail(&self, error: SseError) {
        tracing::debug!(session = %self.session_id, "Session failed: {}", error);
        self.listener.on_failure(&error).await;
    }
}

/// Resolve once cancellation was requested or the handle was dropped.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow_and_update() {
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

async fn read_chunk(
    response: &mut reqwest::Response,
    read_timeout: Duration,
) -> Result<Option<Bytes>> {
    if read_timeout.is_zero() {
        return response.chunk().await.map_err(SseError::Stream);
    }

    match tokio::time::timeout(read_timeout, response.chunk()).await {
        Ok(chunk) => chunk.map_err(SseError::Stream),
        Err(_) => Err(SseError::ReadTimeout(read_timeout)),
    }
}

/// Returns the offending content type, if the response is not an event stream.
///
/// A missing content type is tolerated.
fn unexpected_content_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?;
    let text = value.to_str().unwrap_or_default();
    let media_type = text.split(';').next().unwrap_or_default().trim();

    if media_type.eq_ignore_ascii_case(EVENT_STREAM_MEDIA_TYPE) {
        None
    } else {
        Some(text.to_string())
    }
}
