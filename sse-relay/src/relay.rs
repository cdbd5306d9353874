//! Synchronous facade that owns the transport runtime and the supervisor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sse_client::{EventSourceFactory, HttpEventSourceFactory};
use stream_publisher::{DurableStream, StreamPublisher};

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::reporter::MetricsReporter;
use crate::router::EventRouter;
use crate::shutdown::{ShutdownHandle, TerminationGuard, TerminationLatch};
use crate::state::{RelayStats, RuntimeState};
use crate::supervisor::ConnectionSupervisor;

/// Upper bound on how long in-flight transport tasks get after shutdown.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Relays events from one SSE endpoint to one durable stream.
///
/// ```rust,ignore
/// use sse_relay::{RelayConfig, SseRelay};
///
/// let config = RelayConfig::new(
///     "https://stream.wikimedia.org/v2/stream/recentchange",
///     "wiki-changes",
///     "us-east-1",
/// );
/// let relay = SseRelay::new(config);
/// let shutdown = relay.shutdown_handle();
/// ctrlc::set_handler(move || {
///     shutdown.shutdown_and_wait(std::time::Duration::from_secs(1));
/// })?;
/// let stats = relay.start()?;
/// ```
pub struct SseRelay {
    config: RelayConfig,
    state: Arc<RuntimeState>,
    latch: Arc<TerminationLatch>,
    started: AtomicBool,
    stream: Option<Arc<dyn DurableStream>>,
    factory: Option<Arc<dyn EventSourceFactory>>,
}

impl SseRelay {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            state: Arc::new(RuntimeState::new()),
            latch: Arc::new(TerminationLatch::new()),
            started: AtomicBool::new(false),
            stream: None,
            factory: None,
        }
    }

    /// Publish to `stream` instead of building a Kinesis client.
    pub fn with_stream(mut self, stream: Arc<dyn DurableStream>) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Open sessions through `factory` instead of the HTTP transport.
    pub fn with_event_source_factory(mut self, factory: Arc<dyn EventSourceFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(Arc::clone(&self.state), Arc::clone(&self.latch))
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> RelayStats {
        self.state.stats()
    }

    /// Run the relay on the calling thread until shutdown.
    ///
    /// Blocks. Can be called once per relay; later calls return
    /// [`RelayError::AlreadyStarted`].
    pub fn start(&self) -> Result<RelayStats> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RelayError::AlreadyStarted);
        }
        let _termination = TerminationGuard(Arc::clone(&self.latch));

        self.config.log_summary();
        if let Err(e) = self.config.validate() {
            tracing::error!("{}", e);
            self.state.stop();
            return Err(e);
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("sse-transport")
            .enable_all()
            .build()
            .map_err(|e| RelayError::Runtime(e.to_string()))?;

        let stream = match &self.stream {
            Some(stream) => Arc::clone(stream),
            None => self.default_stream(&runtime)?,
        };

        let factory: Arc<dyn EventSourceFactory> = match &self.factory {
            Some(factory) => Arc::clone(factory),
            None => Arc::new(HttpEventSourceFactory::new(
                &self.config.client_config(),
                &self.config.request()?,
            )?),
        };

        let publisher = Arc::new(
            StreamPublisher::new(stream).with_log_threshold(self.config.publish_log_threshold),
        );
        let router = Arc::new(EventRouter::new(
            self.config.collect_types.clone(),
            Arc::clone(&self.state),
            self.config.reporting_enabled(),
        ));

        tracing::info!("Starting relay to stream '{}'", self.config.stream_name);
        let mut supervisor = ConnectionSupervisor::new(
            factory,
            runtime.handle().clone(),
            router,
            publisher,
            self.config.stream_name.clone(),
            Arc::clone(&self.state),
            MetricsReporter::new(self.config.report_interval),
            self.config.reconnect_policy,
            self.config.wait_quantum,
        );
        supervisor.run();

        runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

        let stats = self.state.stats();
        tracing::info!(
            sessions = stats.sessions_opened,
            accepted = stats.events_accepted,
            published = stats.records_published,
            "Relay stopped"
        );
        Ok(stats)
    }

    #[cfg(feature = "kinesis")]
    fn default_stream(&self, runtime: &tokio::runtime::Runtime) -> Result<Arc<dyn DurableStream>> {
        let stream = runtime.block_on(stream_publisher::KinesisStream::connect(
            &self.config.region,
            self.config.endpoint_url.as_deref(),
        ));
        Ok(Arc::new(stream))
    }

    #[cfg(not(feature = "kinesis"))]
    fn default_stream(&self, _runtime: &tokio::runtime::Runtime) -> Result<Arc<dyn DurableStream>> {
        Err(RelayError::Configuration(
            "No durable stream configured and Kinesis support is disabled".to_string(),
        ))
    }
}
