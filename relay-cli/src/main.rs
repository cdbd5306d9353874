use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sse_relay::{
    parse_header_list, parse_type_list, ReconnectPolicy, RelayConfig, RelayError, SseRelay,
};
use tracing::{error, info};

/// How long Ctrl+C waits for the relay to wind down before giving up.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Relay server-sent events into an Amazon Kinesis data stream
///
/// Every option can also be set through the environment variable shown in
/// its help text.
#[derive(Parser, Debug)]
#[command(name = "sse-relay")]
#[command(version)]
pub struct Args {
    /// URL of the SSE endpoint
    #[arg(short, long, env = "SSE_RELAY_URL")]
    pub url: String,

    /// Name of the Kinesis data stream to publish to
    #[arg(short, long, env = "SSE_RELAY_STREAM")]
    pub stream: String,

    /// AWS region of the data stream
    #[arg(short, long, env = "SSE_RELAY_REGION")]
    pub region: String,

    /// Request headers as a flat list: name1,value1,name2,value2
    #[arg(long, env = "SSE_RELAY_HEADERS")]
    pub headers: Option<String>,

    /// Event types to forward, comma separated; all types when omitted
    #[arg(short = 't', long, env = "SSE_RELAY_TYPES")]
    pub types: Option<String>,

    /// Throughput report interval in milliseconds (0 disables reporting)
    #[arg(long = "reportms", env = "SSE_RELAY_REPORT_MS", default_value = "30000")]
    pub report_ms: u64,

    /// Read timeout in milliseconds (0 means no timeout)
    #[arg(long = "readtimeoutms", env = "SSE_RELAY_READ_TIMEOUT_MS", default_value = "0")]
    pub read_timeout_ms: u64,

    /// Largest accepted event in bytes; a larger one ends the session
    #[arg(long, env = "SSE_RELAY_MAX_EVENT_BYTES", default_value = "1048576")]
    pub max_event_bytes: usize,

    /// Override the Kinesis endpoint, e.g. for a local emulator
    #[arg(long, env = "SSE_RELAY_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Back off between failed reconnects, starting at this many milliseconds
    #[arg(long, env = "SSE_RELAY_BACKOFF_MS")]
    pub backoff_ms: Option<u64>,

    /// Upper bound for the reconnect backoff in milliseconds
    #[arg(long, env = "SSE_RELAY_MAX_BACKOFF_MS", default_value = "30000")]
    pub max_backoff_ms: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "SSE_RELAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "SSE_RELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Args {
    /// Translate the command line into a relay configuration.
    pub fn to_config(&self) -> Result<RelayConfig, RelayError> {
        let headers = match &self.headers {
            Some(raw) => parse_header_list(raw)?,
            None => Vec::new(),
        };

        let reconnect_policy = match self.backoff_ms {
            Some(initial) => ReconnectPolicy::backoff(
                Duration::from_millis(initial),
                Duration::from_millis(self.max_backoff_ms),
            ),
            None => ReconnectPolicy::Immediate,
        };

        Ok(RelayConfig::new(&self.url, &self.stream, &self.region)
            .with_headers(headers)
            .with_collect_types(self.types.as_deref().and_then(parse_type_list))
            .with_report_interval(Duration::from_millis(self.report_ms))
            .with_read_timeout(Duration::from_millis(self.read_timeout_ms))
            .with_max_event_size(self.max_event_bytes)
            .with_endpoint_url(self.endpoint_url.clone())
            .with_reconnect_policy(reconnect_policy))
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(&args.log_level, args.log_format) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.to_config().context("Invalid command line")?;
    let relay = SseRelay::new(config);

    let shutdown = relay.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Interrupted, shutting down");
        shutdown.shutdown_and_wait(SHUTDOWN_TIMEOUT);
    })
    .context("Failed to install Ctrl+C handler")?;

    let stats = relay.start().context("Relay failed to start")?;
    info!(
        "Relayed {} of {} accepted events over {} sessions",
        stats.records_published, stats.events_accepted, stats.sessions_opened
    );
    Ok(())
}

/// Initialize tracing with the given level and output format.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = match log_level.to_lowercase().as_str() {
        level @ ("error" | "warn" | "info" | "debug" | "trace") => level.to_string(),
        _ => "info".to_string(),
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
