//! AWS Kinesis Data Streams publisher.

use async_trait::async_trait;
use aws_sdk_kinesis::Client;
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;

use crate::error::{AppError, Result};
use crate::publisher::{PublishReceipt, RecordPublisher, StreamRecord};

/// Kinesis-backed publisher issuing one `PutRecord` per record.
#[derive(Clone)]
pub struct KinesisPublisher {
    client: Client,
}

impl KinesisPublisher {
    /// Create a new Kinesis publisher.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a publisher from the default AWS environment
    /// (region, credentials, endpoint overrides).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl RecordPublisher for KinesisPublisher {
    async fn publish(&self, record: &StreamRecord) -> Result<PublishReceipt> {
        let output = self
            .client
            .put_record()
            .stream_name(&record.stream_name)
            .partition_key(&record.partition_key)
            .data(Blob::new(record.data.clone()))
            .send()
            .await
            .map_err(|e| AppError::publish(&record.stream_name, DisplayErrorContext(e)))?;

        Ok(PublishReceipt {
            shard_id: output.shard_id().to_string(),
            sequence_number: output.sequence_number().to_string(),
        })
    }
}
