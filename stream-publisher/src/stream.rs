//! The durable stream abstraction.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Where an appended record landed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordReceipt {
    /// Shard (partition) that accepted the record
    pub shard_id: String,
    /// Position of the record within the shard
    pub sequence_number: String,
}

/// A partition-ordered, append-only log.
///
/// Records sharing a partition key keep their relative order. Implementations
/// perform a single attempt per call and do not retry.
#[async_trait]
pub trait DurableStream: Send + Sync {
    /// Append one record to `stream_name`.
    async fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        data: Bytes,
    ) -> Result<RecordReceipt>;
}
