//! Fire-and-forget publishing of event payloads.

use std::sync::Arc;

use bytes::Bytes;

use crate::stream::DurableStream;
use crate::suppressor::{LogSuppressor, DEFAULT_LOG_THRESHOLD};

/// Appends payloads to a durable stream without ever failing the caller.
///
/// A failed append drops the payload. Failure logging is rate limited per
/// streak of consecutive failures so a sustained outage (throttling, lost
/// permissions) does not flood the log.
pub struct StreamPublisher {
    stream: Arc<dyn DurableStream>,
    suppressor: LogSuppressor,
}

impl StreamPublisher {
    pub fn new(stream: Arc<dyn DurableStream>) -> Self {
        Self {
            stream,
            suppressor: LogSuppressor::new(DEFAULT_LOG_THRESHOLD),
        }
    }

    /// Change how many failures of a streak are logged.
    pub fn with_log_threshold(mut self, threshold: u32) -> Self {
        self.suppressor = LogSuppressor::new(threshold);
        self
    }

    /// Append `payload` to `stream_id` under `partition_key`.
    ///
    /// Returns whether the record was accepted.
    pub async fn publish(&self, payload: &str, partition_key: &str, stream_id: &str) -> bool {
        let data = Bytes::copy_from_slice(payload.as_bytes());

        match self.stream.put_record(stream_id, partition_key, data).await {
            Ok(receipt) => {
                let suppressed = self.suppressor.record_success();
                if suppressed > 0 {
                    tracing::info!(
                        "Publishing on '{}' recovered; {} further errors were not logged",
                        stream_id,
                        suppressed
                    );
                }
                tracing::debug!(
                    shard = %receipt.shard_id,
                    sequence = %receipt.sequence_number,
                    "Published on '{}' partition '{}' data: {}",
                    stream_id,
                    partition_key,
                    payload
                );
                true
            }
            Err(e) => {
                if self.suppressor.record_failure() {
                    tracing::error!(
                        "Error publishing on '{}' partition '{}' data: {}: {}",
                        stream_id,
                        partition_key,
                        payload,
                        e
                    );
                }
                false
            }
        }
    }

    /// Consecutive failures since the last success.
    pub fn error_streak(&self) -> u32 {
        self.suppressor.streak()
    }
}
