//! Stream publishing backends.
//!
//! Every record goes out as its own put, in the order the provider
//! returned it, under a single constant partition key. All records
//! therefore land on one shard.
//!
//! - [`KinesisPublisher`]: AWS Kinesis Data Streams (`kinesis` feature)
//! - [`LocalStreamPublisher`]: JSON-lines file per stream, for local runs

#[cfg(feature = "kinesis")]
pub mod kinesis;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
#[cfg(feature = "kinesis")]
pub use kinesis::KinesisPublisher;
pub use local::LocalStreamPublisher;

/// Partition key used for every record.
pub const PARTITION_KEY: &str = "partition-key";

/// A single put request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    /// Destination stream
    pub stream_name: String,
    /// Routing key
    pub partition_key: String,
    /// UTF-8 JSON payload
    pub data: Vec<u8>,
}

impl StreamRecord {
    /// Build a record for `stream_name` under [`PARTITION_KEY`].
    pub fn new(stream_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            stream_name: stream_name.into(),
            partition_key: PARTITION_KEY.to_string(),
            data,
        }
    }
}

/// Where the stream put a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub shard_id: String,
    pub sequence_number: String,
}

/// Trait for stream publishing backends.
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    /// Publish one record. Not retried by the caller.
    async fn publish(&self, record: &StreamRecord) -> Result<PublishReceipt>;
}
