//! Integration tests for HTTP event sources.
//!
//! These tests start a local warp server that speaks `text/event-stream`,
//! open real sessions against it and record every listener callback.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use sse_client::{
    ClientConfig, EventSourceFactory, EventSourceListener, HttpEventSourceFactory, SessionInfo,
    SseError, SseEvent, SseRequest,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use warp::Filter;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Open(u16),
    Event(SseEvent),
    Closed,
    Failure(String),
}

struct Recorder {
    tx: mpsc::UnboundedSender<Call>,
}

#[async_trait]
impl EventSourceListener for Recorder {
    async fn on_open(&self, session: &SessionInfo) {
        let _ = self.tx.send(Call::Open(session.status));
    }

    async fn on_event(&self, event: SseEvent) {
        let _ = self.tx.send(Call::Event(event));
    }

    async fn on_closed(&self) {
        let _ = self.tx.send(Call::Closed);
    }

    async fn on_failure(&self, error: &SseError) {
        let _ = self.tx.send(Call::Failure(error.to_string()));
    }
}

fn recorder() -> (Arc<Recorder>, mpsc::UnboundedReceiver<Call>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(Recorder { tx }), rx)
}

async fn next_call(rx: &mut mpsc::UnboundedReceiver<Call>) -> Call {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("Timeout waiting for listener callback")
        .expect("Listener channel closed")
}

fn start_server() -> SocketAddr {
    let finite = warp::path("events").map(|| {
        warp::http::Response::builder()
            .header("content-type", "text/event-stream")
            .body("id: 1\nevent: edit\ndata: one\n\n: ping\n\nevent: log\ndata: two\n\n")
    });

    let missing = warp::path("missing").map(|| {
        warp::reply::with_status("gone", warp::http::StatusCode::NOT_FOUND)
    });

    let html = warp::path("html").map(|| warp::reply::html("<html></html>"));

    let echo = warp::path("echo")
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::header::optional::<String>("accept"))
        .map(|auth: Option<String>, accept: Option<String>| {
            let body = format!(
                "event: headers\ndata: {}|{}\n\n",
                auth.unwrap_or_default(),
                accept.unwrap_or_default()
            );
            warp::http::Response::builder()
                .header("content-type", "text/event-stream")
                .body(body)
        });

    // one event, then the connection stays open without sending anything
    let stalled = warp::path("stalled").map(|| {
        let first = futures::stream::once(async {
            Ok::<_, Infallible>(warp::sse::Event::default().event("edit").data("first"))
        });
        warp::sse::reply(first.chain(futures::stream::pending()))
    });

    // a single line that never ends
    let flood = warp::path("flood").map(|| {
        warp::http::Response::builder()
            .header("content-type", "text/event-stream")
            .body(format!("data: {}", "x".repeat(64 * 1024)))
    });

    let routes = finite.or(missing).or(html).or(echo).or(stalled).or(flood);
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn factory(addr: SocketAddr, path: &str, config: ClientConfig) -> HttpEventSourceFactory {
    let request = SseRequest::new(&format!("http://{addr}/{path}"))
        .unwrap()
        .with_header("Authorization", "Bearer token-123");
    HttpEventSourceFactory::new(&config, &request).expect("Failed to build factory")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_finite_stream_delivers_events_then_closes() {
    let addr = start_server();
    let (listener, mut rx) = recorder();

    let _handle = factory(addr, "events", ClientConfig::default())
        .open(&tokio::runtime::Handle::current(), listener)
        .unwrap();

    assert_eq!(next_call(&mut rx).await, Call::Open(200));
    assert_eq!(
        next_call(&mut rx).await,
        Call::Event(SseEvent::new("edit", "one").with_id("1"))
    );
    assert_eq!(
        next_call(&mut rx).await,
        Call::Event(SseEvent::new("log", "two").with_id("1"))
    );
    assert_eq!(next_call(&mut rx).await, Call::Closed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_status_fails_without_opening() {
    let addr = start_server();
    let (listener, mut rx) = recorder();

    let _handle = factory(addr, "missing", ClientConfig::default())
        .open(&tokio::runtime::Handle::current(), listener)
        .unwrap();

    match next_call(&mut rx).await {
        Call::Failure(message) => assert!(message.contains("404"), "{message}"),
        other => panic!("Expected failure, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_content_type_fails() {
    let addr = start_server();
    let (listener, mut rx) = recorder();

    let _handle = factory(addr, "html", ClientConfig::default())
        .open(&tokio::runtime::Handle::current(), listener)
        .unwrap();

    match next_call(&mut rx).await {
        Call::Failure(message) => assert!(message.contains("text/html"), "{message}"),
        other => panic!("Expected failure, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_configured_and_fixed_headers_are_sent() {
    let addr = start_server();
    let (listener, mut rx) = recorder();

    let _handle = factory(addr, "echo", ClientConfig::default())
        .open(&tokio::runtime::Handle::current(), listener)
        .unwrap();

    assert_eq!(next_call(&mut rx).await, Call::Open(200));
    assert_eq!(
        next_call(&mut rx).await,
        Call::Event(SseEvent::new("headers", "Bearer token-123|text/event-stream"))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_timeout_fails_idle_session() {
    let addr = start_server();
    let (listener, mut rx) = recorder();
    let config = ClientConfig::default().with_read_timeout(Duration::from_millis(200));

    let _handle = factory(addr, "stalled", config)
        .open(&tokio::runtime::Handle::current(), listener)
        .unwrap();

    assert_eq!(next_call(&mut rx).await, Call::Open(200));
    assert_eq!(
        next_call(&mut rx).await,
        Call::Event(SseEvent::new("edit", "first"))
    );
    match next_call(&mut rx).await {
        Call::Failure(message) => assert!(message.contains("No data received"), "{message}"),
        other => panic!("Expected read timeout, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_closes_open_session() {
    let addr = start_server();
    let (listener, mut rx) = recorder();

    let handle = factory(addr, "stalled", ClientConfig::default())
        .open(&tokio::runtime::Handle::current(), listener)
        .unwrap();

    assert_eq!(next_call(&mut rx).await, Call::Open(200));
    assert!(matches!(next_call(&mut rx).await, Call::Event(_)));

    handle.cancel();
    assert_eq!(next_call(&mut rx).await, Call::Closed);

    // exactly one terminal callback
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
    assert!(handle.is_finished());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_refused_reports_failure() {
    let port = {
        let socket = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap().port()
    };
    let (listener, mut rx) = recorder();
    let request = SseRequest::new(&format!("http://127.0.0.1:{port}/events")).unwrap();

    let _handle = HttpEventSourceFactory::new(&ClientConfig::default(), &request)
        .unwrap()
        .open(&tokio::runtime::Handle::current(), listener)
        .unwrap();

    match next_call(&mut rx).await {
        Call::Failure(message) => assert!(message.starts_with("Connection failed"), "{message}"),
        other => panic!("Expected connect failure, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_event_fails_session() {
    let addr = start_server();
    let (listener, mut rx) = recorder();
    let config = ClientConfig::default().with_max_event_size(4096);

    let _handle = factory(addr, "flood", config)
        .open(&tokio::runtime::Handle::current(), listener)
        .unwrap();

    assert_eq!(next_call(&mut rx).await, Call::Open(200));
    match next_call(&mut rx).await {
        Call::Failure(message) => assert!(message.contains("maximum size"), "{message}"),
        other => panic!("Expected oversized event failure, got {other:?}"),
    }
}

#[test]
fn test_factory_targets_request_url() {
    let request = SseRequest::new("https://stream.example.org/v2/stream/recentchange").unwrap();
    let factory = HttpEventSourceFactory::new(&ClientConfig::default(), &request).unwrap();

    assert_eq!(factory.url(), request.url());
}
