//! # stream-publisher
//!
//! Publishing to a durable, partition-ordered stream.
//!
//! [`DurableStream`] is the seam to the storage service; [`KinesisStream`]
//! implements it for Amazon Kinesis Data Streams. [`StreamPublisher`] wraps a
//! stream with the relay's delivery contract: one attempt per record, errors
//! never reach the caller, and repeated failures are logged through a
//! [`LogSuppressor`].

mod error;
mod publisher;
mod stream;
mod suppressor;

#[cfg(feature = "kinesis")]
mod kinesis;

#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use error::{PublishError, Result};
pub use publisher::StreamPublisher;
pub use stream::{DurableStream, RecordReceipt};
pub use suppressor::{LogSuppressor, DEFAULT_LOG_THRESHOLD};

#[cfg(feature = "kinesis")]
pub use kinesis::KinesisStream;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryStream, StoredRecord};
