//! In-memory durable stream for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::{PublishError, Result};
use crate::stream::{DurableStream, RecordReceipt};

/// A record captured by [`MemoryStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub stream_name: String,
    pub partition_key: String,
    pub data: Bytes,
}

/// Records every append in memory; can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryStream {
    records: Mutex<Vec<StoredRecord>>,
    failure: Mutex<Option<PublishError>>,
    attempts: AtomicUsize,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every following append with `error` until [`recover`](Self::recover).
    pub fn fail_with(&self, error: PublishError) {
        *self.failure.lock() = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// Snapshot of the accepted records, in append order.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of appends attempted, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DurableStream for MemoryStream {
    async fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        data: Bytes,
    ) -> Result<RecordReceipt> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        let mut records = self.records.lock();
        records.push(StoredRecord {
            stream_name: stream_name.to_string(),
            partition_key: partition_key.to_string(),
            data,
        });

        Ok(RecordReceipt {
            shard_id: "shardId-000000000000".to_string(),
            sequence_number: records.len().to_string(),
        })
    }
}
