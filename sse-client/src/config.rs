//! Connection settings and request description for an event stream.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, CACHE_CONTROL};
use url::Url;

use crate::error::{Result, SseError};
use crate::parser::DEFAULT_MAX_EVENT_SIZE;

/// Media type requested from and expected of the endpoint.
pub const EVENT_STREAM_MEDIA_TYPE: &str = "text/event-stream";

/// Transport-level settings shared by every session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum idle time between two body chunks
    /// Default: zero, meaning no limit
    pub read_timeout: Duration,

    /// Maximum time to establish the TCP/TLS connection
    /// Default: 10 seconds
    pub connect_timeout: Option<Duration>,

    /// Largest event, in bytes, a session buffers before failing
    /// Default: 1 MiB
    pub max_event_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::ZERO,
            connect_timeout: Some(Duration::from_secs(10)),
            max_event_size: DEFAULT_MAX_EVENT_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a ClientConfig with default values
    pub fn new() -> Self {
        Self::default()
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
}

/// The streaming GET request opened for every session.
#[derive(Debug, Clone)]
pub struct SseRequest {
    url: Url,
    headers: Vec<(String, String)>,
}

impl SseRequest {
    /// Describe a request to `url`, which must be an absolute http(s) URL.
    pub fn new(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| SseError::InvalidRequest(format!("invalid URL '{url}': {e}")))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(SseError::InvalidRequest(format!(
                    "unsupported URL scheme '{other}'"
                )))
            }
        }

        Ok(Self {
            url: parsed,
            headers: Vec::new(),
        })
    }

    /// Add a caller-supplied header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several caller-supplied headers in order.
    pub fn with_headers<I, N, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(n, v)| (n.into(), v.into())));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Build the final header map.
    ///
    /// Caller headers are applied first; the event-stream headers are applied
    /// last and replace any caller value for the same name.
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SseError::InvalidRequest(format!("invalid header name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                SseError::InvalidRequest(format!("invalid value for header '{name}': {e}"))
            })?;
            map.append(name, value);
        }

        map.insert(ACCEPT, HeaderValue::from_static(EVENT_STREAM_MEDIA_TYPE));
        map.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        map.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

        Ok(map)
    }
}
