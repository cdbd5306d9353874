//! Amazon Kinesis Data Streams backend.

use async_trait::async_trait;
use aws_sdk_kinesis::config::Region;
use aws_sdk_kinesis::error::{DisplayErrorContext, SdkError};
use aws_sdk_kinesis::operation::put_record::PutRecordError;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::Client;
use bytes::Bytes;

use crate::error::{PublishError, Result};
use crate::stream::{DurableStream, RecordReceipt};

/// [`DurableStream`] backed by a Kinesis data stream.
#[derive(Debug, Clone)]
pub struct KinesisStream {
    client: Client,
    region: String,
}

impl KinesisStream {
    /// Create a client for `region` from the default credential chain.
    ///
    /// `endpoint_url` overrides the service endpoint (local emulators, VPC endpoints).
    pub async fn connect(region: &str, endpoint_url: Option<&str>) -> Self {
        tracing::info!("Initializing Kinesis client for region {}", region);

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()));
        if let Some(endpoint) = endpoint_url {
            tracing::info!("Using Kinesis endpoint override {}", endpoint);
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        Self {
            client: Client::new(&config),
            region: region.to_string(),
        }
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl DurableStream for KinesisStream {
    async fn put_record(
        &self,
        stream_name: &str,
        partition_key: &str,
        data: Bytes,
    ) -> Result<RecordReceipt> {
        let output = self
            .client
            .put_record()
            .stream_name(stream_name)
            .partition_key(partition_key)
            .data(Blob::new(data.to_vec()))
            .send()
            .await
            .map_err(classify)?;

        Ok(RecordReceipt {
            shard_id: output.shard_id().to_string(),
            sequence_number: output.sequence_number().to_string(),
        })
    }
}

fn classify(err: SdkError<PutRecordError>) -> PublishError {
    let message = DisplayErrorContext(&err).to_string();

    match &err {
        SdkError::ServiceError(service) => match service.err() {
            PutRecordError::ProvisionedThroughputExceededException(_)
            | PutRecordError::KmsThrottlingException(_) => PublishError::Throttled(message),
            PutRecordError::AccessDeniedException(_)
            | PutRecordError::ResourceNotFoundException(_)
            | PutRecordError::InvalidArgumentException(_) => PublishError::Rejected(message),
            _ => PublishError::Service(message),
        },
        _ => PublishError::Other(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::BehaviorVersion;

    #[test]
    fn test_from_client_keeps_region() {
        let config = aws_sdk_kinesis::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .build();
        let stream = KinesisStream::from_client(Client::from_conf(config), "eu-west-1");

        assert_eq!(stream.region(), "eu-west-1");
    }

    #[tokio::test]
    async fn test_connect_with_endpoint_override() {
        let stream = KinesisStream::connect("us-west-2", Some("http://localhost:4566")).await;

        assert_eq!(stream.region(), "us-west-2");
        let region = stream.client.config().region().map(ToString::to_string);
        assert_eq!(region.as_deref(), Some("us-west-2"));
    }
}
