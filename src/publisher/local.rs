//! Local filesystem stream emulation.
//!
//! Appends one JSON line per record for development and testing.
//! Production deployments should use KinesisPublisher.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! └── {stream_name}.jsonl   # one LocalStreamEntry per line, append-only
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::publisher::{PublishReceipt, RecordPublisher, StreamRecord};

/// The emulated stream has a single shard.
const LOCAL_SHARD_ID: &str = "shardId-000000000000";

/// One line of a local stream file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalStreamEntry {
    pub sequence_number: String,
    pub shard_id: String,
    pub partition_key: String,
    pub approximate_arrival_timestamp: DateTime<Utc>,
    /// Record payload as published
    pub data: String,
}

/// Local filesystem stream backend.
pub struct LocalStreamPublisher {
    root_dir: PathBuf,
    /// Next sequence number per stream, seeded from the stream's file on first publish
    next_sequence: Mutex<HashMap<String, u64>>,
}

impl LocalStreamPublisher {
    /// Create a new publisher writing under the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            next_sequence: Mutex::new(HashMap::new()),
        }
    }

    /// File backing a stream.
    pub fn stream_path(&self, stream_name: &str) -> Result<PathBuf> {
        let valid = !stream_name.is_empty()
            && stream_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && stream_name != "."
            && stream_name != "..";
        if !valid {
            return Err(AppError::publish(stream_name, "invalid stream name"));
        }
        Ok(self.root_dir.join(format!("{stream_name}.jsonl")))
    }

    /// Read every entry of a stream, oldest first.
    pub async fn read_all(&self, stream_name: &str) -> Result<Vec<LocalStreamEntry>> {
        let path = self.stream_path(stream_name)?;
        read_entries(&path).await
    }

    /// Append a line, creating the directory and file as needed.
    async fn append_line(&self, path: &Path, line: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

async fn read_entries(path: &Path) -> Result<Vec<LocalStreamEntry>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::Io(e)),
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(AppError::from))
        .collect()
}

#[async_trait]
impl RecordPublisher for LocalStreamPublisher {
    async fn publish(&self, record: &StreamRecord) -> Result<PublishReceipt> {
        let path = self.stream_path(&record.stream_name)?;
        let data = String::from_utf8(record.data.clone())
            .map_err(|e| AppError::publish(&record.stream_name, e))?;

        // Held across the write so sequence numbers follow file order.
        let mut next = self.next_sequence.lock().await;
        let sequence = match next.get(&record.stream_name) {
            Some(&n) => n,
            None => read_entries(&path)
                .await?
                .last()
                .and_then(|e| e.sequence_number.parse::<u64>().ok())
                .map_or(1, |n| n + 1),
        };

        let entry = LocalStreamEntry {
            sequence_number: format!("{sequence:020}"),
            shard_id: LOCAL_SHARD_ID.to_string(),
            partition_key: record.partition_key.clone(),
            approximate_arrival_timestamp: Utc::now(),
            data,
        };
        let line = serde_json::to_vec(&entry)?;
        self.append_line(&path, &line).await?;
        next.insert(record.stream_name.clone(), sequence + 1);

        Ok(PublishReceipt {
            shard_id: entry.shard_id,
            sequence_number: entry.sequence_number,
        })
    }
}
