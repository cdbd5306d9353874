//! Relay configuration
//!
//! The relay receives an already assembled [`RelayConfig`]. Required fields are
//! checked once by [`RelayConfig::validate`] before any connection is made; a
//! failure there is fatal rather than retryable.

use std::time::Duration;

use sse_client::{ClientConfig, SseRequest, DEFAULT_MAX_EVENT_SIZE};
use stream_publisher::DEFAULT_LOG_THRESHOLD;

use crate::error::{RelayError, Result};
use crate::reconnect::ReconnectPolicy;

/// Default interval between throughput reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(30_000);

/// Default sleep quantum of the supervisor's wait loop.
pub const DEFAULT_WAIT_QUANTUM: Duration = Duration::from_millis(100);

/// Configuration for an [`SseRelay`](crate::SseRelay)
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// SSE endpoint URL (required)
    pub url: String,

    /// Name of the destination stream (required)
    pub stream_name: String,

    /// Region of the destination stream (required)
    pub region: String,

    /// Extra request headers, in order
    pub headers: Vec<(String, String)>,

    /// Event types to forward; `None` or empty forwards everything
    pub collect_types: Option<Vec<String>>,

    /// Idle limit between body chunks
    /// Default: zero (unbounded), which is the recommended setting
    pub read_timeout: Duration,

    /// Limit for establishing the connection
    /// Default: 10 seconds
    pub connect_timeout: Option<Duration>,

    /// Largest event, in bytes, accepted from the endpoint; a larger one ends
    /// the session
    /// Default: 1 MiB
    pub max_event_size: usize,

    /// Interval between throughput reports; zero disables reporting and counting
    /// Default: 30 seconds
    pub report_interval: Duration,

    /// Pacing of reconnect attempts
    /// Default: immediate, unlimited
    pub reconnect_policy: ReconnectPolicy,

    /// Sleep quantum of the supervisor's wait loop; bounds shutdown latency
    /// Default: 100 milliseconds
    pub wait_quantum: Duration,

    /// Override for the destination service endpoint
    pub endpoint_url: Option<String>,

    /// Consecutive publish failures logged before suppression
    /// Default: 2
    pub publish_log_threshold: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            stream_name: String::new(),
            region: String::new(),
            headers: Vec::new(),
            collect_types: None,
            read_timeout: Duration::ZERO,
            connect_timeout: Some(Duration::from_secs(10)),
            max_event_size: DEFAULT_MAX_EVENT_SIZE,
            report_interval: DEFAULT_REPORT_INTERVAL,
            reconnect_policy: ReconnectPolicy::Immediate,
            wait_quantum: DEFAULT_WAIT_QUANTUM,
            endpoint_url: None,
            publish_log_threshold: DEFAULT_LOG_THRESHOLD,
        }
    }
}

impl RelayConfig {
    /// Create a configuration with the three required fields and defaults elsewhere.
    pub fn new(
        url: impl Into<String>,
        stream_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            stream_name: stream_name.into(),
            region: region.into(),
            ..Default::default()
        }
    }

    /// Check required fields and the shape of optional ones.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(RelayError::Configuration("URL not specified".to_string()));
        }

        if self.stream_name.trim().is_empty() {
            return Err(RelayError::Configuration(
                "Destination stream not specified".to_string(),
            ));
        }

        if self.region.trim().is_empty() {
            return Err(RelayError::Configuration("Region not specified".to_string()));
        }

        self.request()?
            .header_map()
            .map_err(|e| RelayError::Configuration(e.to_string()))?;

        if self.max_event_size == 0 {
            return Err(RelayError::Configuration(
                "Maximum event size must be greater than 0".to_string(),
            ));
        }

        if self.wait_quantum.is_zero() {
            return Err(RelayError::Configuration(
                "Wait quantum must be greater than 0".to_string(),
            ));
        }

        if let ReconnectPolicy::Backoff { initial, max, .. } = self.reconnect_policy {
            if initial.is_zero() || initial > max {
                return Err(RelayError::Configuration(
                    "Invalid backoff: initial must be positive and not exceed max".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Whether throughput reporting (and counting) is enabled.
    pub fn reporting_enabled(&self) -> bool {
        !self.report_interval.is_zero()
    }

    /// The streaming request described by this configuration.
    pub fn request(&self) -> Result<SseRequest> {
        let request = SseRequest::new(&self.url)
            .map_err(|e| RelayError::Configuration(e.to_string()))?;
        Ok(request.with_headers(self.headers.iter().cloned()))
    }

    /// Transport settings described by this configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_read_timeout(self.read_timeout)
            .with_connect_timeout(self.connect_timeout)
            .with_max_event_size(self.max_event_size)
    }

    /// Log every setting, `N/A` standing in for absent values.
    pub fn log_summary(&self) {
        fn or_na(value: &str) -> &str {
            if value.is_empty() {
                "N/A"
            } else {
                value
            }
        }

        let headers = self
            .headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let types = self
            .collect_types
            .as_ref()
            .map(|types| types.join(","))
            .unwrap_or_default();

        tracing::info!("URL: {}", or_na(&self.url));
        tracing::info!("Destination stream: {}", or_na(&self.stream_name));
        tracing::info!("Region: {}", or_na(&self.region));
        // header values may carry credentials; names only
        tracing::info!("Headers: {}", or_na(&headers));
        tracing::info!("Collect types: {}", or_na(&types));
        tracing::info!("Read timeout: {}ms", self.read_timeout.as_millis());
        tracing::info!(
            "Report messages received: {}ms",
            self.report_interval.as_millis()
        );
        tracing::info!("Max event size: {} bytes", self.max_event_size);
        tracing::info!("Reconnect policy: {:?}", self.reconnect_policy);
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_collect_types(mut self, types: Option<Vec<String>>) -> Self {
        self.collect_types = types;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_event_size(mut self, bytes: usize) -> Self {
        self.max_event_size = bytes;
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    pub fn with_wait_quantum(mut self, quantum: Duration) -> Self {
        self.wait_quantum = quantum;
        self
    }

    pub fn with_endpoint_url(mut self, endpoint: Option<String>) -> Self {
        self.endpoint_url = endpoint;
        self
    }

    pub fn with_publish_log_threshold(mut self, threshold: u32) -> Self {
        self.publish_log_threshold = threshold;
        self
    }
}

/// Parse the external `name1,value1,name2,value2` header form.
///
/// An empty string means no headers. An odd number of items is an error.
pub fn parse_header_list(raw: &str) -> Result<Vec<(String, String)>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<&str> = raw.split(',').collect();
    if items.len() % 2 != 0 {
        return Err(RelayError::Configuration(format!(
            "Headers must be name,value pairs; got {} items",
            items.len()
        )));
    }

    Ok(items
        .chunks(2)
        .map(|pair| (pair[0].trim().to_string(), pair[1].trim().to_string()))
        .collect())
}

/// Parse the external comma-separated type list.
///
/// Entries are trimmed and empty entries dropped; nothing left means "accept all".
pub fn parse_type_list(raw: &str) -> Option<Vec<String>> {
    let types: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if types.is_empty() {
        None
    } else {
        Some(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid() -> RelayConfig {
        RelayConfig::new(
            "https://stream.example.org/v2/stream/recentchange",
            "wiki-changes",
            "us-east-1",
        )
    }

    #[test]
    fn test_default_config() {
        let config = valid();
        assert_eq!(config.read_timeout, Duration::ZERO);
        assert_eq!(config.report_interval, Duration::from_millis(30_000));
        assert_eq!(config.wait_quantum, Duration::from_millis(100));
        assert_eq!(config.reconnect_policy, ReconnectPolicy::Immediate);
        assert_eq!(config.publish_log_threshold, 2);
        assert!(config.reporting_enabled());
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::missing_url("", "wiki-changes", "us-east-1", "URL not specified")]
    #[case::missing_stream("http://localhost/sse", " ", "us-east-1", "stream not specified")]
    #[case::missing_region("http://localhost/sse", "wiki-changes", "", "Region not specified")]
    #[case::bad_scheme("ws://localhost/sse", "wiki-changes", "us-east-1", "unsupported URL scheme")]
    fn test_validation_failures(
        #[case] url: &str,
        #[case] stream: &str,
        #[case] region: &str,
        #[case] message: &str,
    ) {
        let err = RelayConfig::new(url, stream, region).validate().unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
        assert!(err.to_string().contains(message), "{err}");
    }

    #[test]
    fn test_invalid_header_is_a_configuration_error() {
        let config = valid().with_headers(vec![("X Bad".to_string(), "v".to_string())]);
        assert!(matches!(
            config.validate(),
            Err(RelayError::Configuration(_))
        ));
    }

    #[test]
    fn test_invalid_backoff_rejected() {
        let config = valid().with_reconnect_policy(ReconnectPolicy::Backoff {
            initial: Duration::from_secs(5),
            max: Duration::from_secs(1),
            jitter: false,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_event_size_reaches_client_config() {
        let config = valid().with_max_event_size(2048);
        assert_eq!(config.client_config().max_event_size, 2048);
        assert_eq!(valid().client_config().max_event_size, DEFAULT_MAX_EVENT_SIZE);
        assert!(valid().with_max_event_size(0).validate().is_err());
    }

    #[test]
    fn test_zero_report_interval_disables_reporting() {
        let config = valid().with_report_interval(Duration::ZERO);
        assert!(!config.reporting_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_header_list() {
        let headers = parse_header_list("Authorization,Bearer abc,X-Client, relay ").unwrap();
        assert_eq!(
            headers,
            vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("X-Client".to_string(), "relay".to_string()),
            ]
        );
        assert!(parse_header_list("").unwrap().is_empty());
        assert!(parse_header_list("Authorization").is_err());
    }

    #[rstest]
    #[case("edit,new", Some(vec!["edit", "new"]))]
    #[case(" edit , ,log ", Some(vec!["edit", "log"]))]
    #[case("", None)]
    #[case(" , ", None)]
    fn test_parse_type_list(#[case] raw: &str, #[case] expected: Option<Vec<&str>>) {
        let expected = expected.map(|v| v.into_iter().map(str::to_string).collect::<Vec<_>>());
        assert_eq!(parse_type_list(raw), expected);
    }
}
