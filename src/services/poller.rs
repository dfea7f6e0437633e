// src/services/poller.rs

//! Fetch-and-publish task.
//!
//! One invocation runs one cycle:
//! 1. Fetch the text-search page, retrying transient failures with backoff
//! 2. Parse the `results` list out of the response
//! 3. Publish every record to the stream, one put per record, in order
//!
//! Publishing only follows a successful fetch, so retries never duplicate
//! records. A publish failure aborts the rest of the batch; records already
//! published stay on the stream.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use thiserror::Error;

use crate::error::{AppError, Result};
use crate::models::{Config, InvocationResult, PlaceRecord, TextSearchResponse};
use crate::publisher::{RecordPublisher, StreamRecord};
use crate::services::places::{PlacesQuery, PlacesSource};
use crate::services::retry::{RetryPolicy, Sleeper, TokioSleeper};

/// Why a cycle failed.
#[derive(Error, Debug)]
pub enum TaskFailure {
    /// Every fetch attempt failed transiently.
    #[error("fetch failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: AppError },

    /// Anything else: bad payload, publish failure, panic. Never retried.
    #[error("unexpected error: {0}")]
    Unexpected(AppError),
}

impl From<&TaskFailure> for InvocationResult {
    fn from(failure: &TaskFailure) -> Self {
        match failure {
            TaskFailure::RetriesExhausted { .. } => InvocationResult::retries_exhausted(),
            TaskFailure::Unexpected(_) => InvocationResult::unexpected_error(),
        }
    }
}

/// Polls the places provider and republishes results onto a stream.
pub struct PlacesPoller {
    source: Arc<dyn PlacesSource>,
    publisher: Arc<dyn RecordPublisher>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
    query: PlacesQuery,
    stream_name: String,
}

impl PlacesPoller {
    /// Create a poller sleeping on the tokio timer between attempts.
    pub fn new(
        config: &Config,
        source: Arc<dyn PlacesSource>,
        publisher: Arc<dyn RecordPublisher>,
    ) -> Self {
        Self {
            source,
            publisher,
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::new(&config.retry),
            query: PlacesQuery::new(config.places.api_key.clone()),
            stream_name: config.stream.name.clone(),
        }
    }

    /// Replace the sleeper used between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run one cycle and convert the outcome into an invocation result.
    ///
    /// Never fails: every error, including a panic inside the cycle, is
    /// logged and mapped to a 500 result.
    pub async fn invoke(&self) -> InvocationResult {
        let outcome = match AssertUnwindSafe(self.poll()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(TaskFailure::Unexpected(AppError::Panicked(panic_message(
                panic.as_ref(),
            )))),
        };

        match outcome {
            Ok(published) => InvocationResult::success(published),
            Err(failure) => {
                if let TaskFailure::Unexpected(e) = &failure {
                    log::error!("Unexpected error: {e}");
                }
                InvocationResult::from(&failure)
            }
        }
    }

    /// Run one cycle, returning the number of records published.
    pub async fn poll(&self) -> std::result::Result<usize, TaskFailure> {
        let body = self.fetch_with_retry().await?;
        let response = TextSearchResponse::parse(&body).map_err(TaskFailure::Unexpected)?;

        if !response.is_healthy() {
            log::warn!(
                "Places provider returned status {}: {}",
                response.status.as_deref().unwrap_or("UNKNOWN"),
                response.error_message.as_deref().unwrap_or("no error message")
            );
        }
        if response.has_next_page {
            log::debug!("Provider offered a next page; only the first page is published");
        }
        log::info!(
            "Retrieved {} places from Google Places.",
            response.results.len()
        );

        self.publish_all(&response.results)
            .await
            .map_err(TaskFailure::Unexpected)
    }

    /// Fetch the response body, retrying transient failures.
    async fn fetch_with_retry(&self) -> std::result::Result<Vec<u8>, TaskFailure> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.source.text_search(&self.query).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(TaskFailure::Unexpected(e)),
                Err(e) => e,
            };

            log::warn!("Attempt {attempt} failed: {error}");
            if !self.policy.should_retry(&error, attempt) {
                log::error!("Max retries reached. Aborting.");
                return Err(TaskFailure::RetriesExhausted {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.policy.backoff(attempt);
            log::info!("Retrying in {} seconds...", delay.as_secs());
            self.sleeper.sleep(delay).await;
        }
    }

    /// Publish records in order, stopping at the first failure.
    async fn publish_all(&self, records: &[PlaceRecord]) -> Result<usize> {
        for record in records {
            let put = StreamRecord::new(&self.stream_name, record.to_payload()?);
            let receipt = self.publisher.publish(&put).await?;
            log::debug!(
                "Published record to {} (shard {}, sequence {})",
                self.stream_name,
                receipt.shard_id,
                receipt.sequence_number
            );
        }
        Ok(records.len())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string payload".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::models::{ApiKey, RETRIES_EXHAUSTED_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
    use crate::publisher::{PARTITION_KEY, PublishReceipt};

    /// Places source replaying a scripted sequence of responses.
    #[derive(Default)]
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<u8>>>>,
        params: Mutex<Vec<Vec<(String, String)>>>,
        panic: bool,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<u8>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.params.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PlacesSource for ScriptedSource {
        async fn text_search(&self, query: &PlacesQuery) -> Result<Vec<u8>> {
            self.params.lock().unwrap().push(
                query
                    .params()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            if self.panic {
                panic!("source exploded");
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AppError::Status { status: 500 }))
        }
    }

    /// Publisher recording every put; optionally failing on the nth call.
    #[derive(Default)]
    struct RecordingPublisher {
        calls: Mutex<Vec<StreamRecord>>,
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl RecordPublisher for RecordingPublisher {
        async fn publish(&self, record: &StreamRecord) -> Result<PublishReceipt> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(record.clone());
            if Some(calls.len()) == self.fail_on_call {
                return Err(AppError::publish(&record.stream_name, "throttled"));
            }
            Ok(PublishReceipt {
                shard_id: "shardId-000000000000".to_string(),
                sequence_number: calls.len().to_string(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    struct Harness {
        source: Arc<ScriptedSource>,
        publisher: Arc<RecordingPublisher>,
        sleeper: Arc<RecordingSleeper>,
        poller: PlacesPoller,
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.stream.name = "places-stream".to_string();
        config.places.api_key = ApiKey::new("test-key");
        config
    }

    fn harness(source: ScriptedSource, publisher: RecordingPublisher) -> Harness {
        let source = Arc::new(source);
        let publisher = Arc::new(publisher);
        let sleeper = Arc::new(RecordingSleeper::default());
        let poller = PlacesPoller::new(&test_config(), source.clone(), publisher.clone())
            .with_sleeper(sleeper.clone());
        Harness {
            source,
            publisher,
            sleeper,
            poller,
        }
    }

    fn body_with(count: usize) -> Vec<u8> {
        let results: Vec<_> = (0..count)
            .map(|i| json!({"place_id": format!("p{i}"), "name": format!("Restoran {i}")}))
            .collect();
        serde_json::to_vec(&json!({"results": results, "status": "OK"})).unwrap()
    }

    fn transient() -> Result<Vec<u8>> {
        Err(AppError::Status { status: 503 })
    }

    #[tokio::test]
    async fn test_publishes_every_record() {
        let h = harness(
            ScriptedSource::new(vec![Ok(body_with(3))]),
            RecordingPublisher::default(),
        );

        let result = h.poller.invoke().await;

        assert_eq!(result.status_code, 200);
        assert!(result.body.contains('3'));
        let calls = h.publisher.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|r| r.partition_key == PARTITION_KEY));
        assert!(calls.iter().all(|r| r.stream_name == "places-stream"));
        assert!(h.sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payloads_are_records_in_order() {
        let h = harness(
            ScriptedSource::new(vec![Ok(body_with(2))]),
            RecordingPublisher::default(),
        );

        h.poller.invoke().await;

        let calls = h.publisher.calls.lock().unwrap();
        let payloads: Vec<serde_json::Value> = calls
            .iter()
            .map(|r| serde_json::from_slice(&r.data).unwrap())
            .collect();
        assert_eq!(payloads[0], json!({"place_id": "p0", "name": "Restoran 0"}));
        assert_eq!(payloads[1], json!({"place_id": "p1", "name": "Restoran 1"}));
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let h = harness(
            ScriptedSource::new(vec![transient(), transient(), Ok(body_with(4))]),
            RecordingPublisher::default(),
        );

        let result = h.poller.invoke().await;

        assert_eq!(result, InvocationResult::success(4));
        assert_eq!(h.source.calls(), 3);
        assert_eq!(h.publisher.calls.lock().unwrap().len(), 4);
        assert_eq!(
            *h.sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let h = harness(
            ScriptedSource::new(vec![transient(), transient(), transient()]),
            RecordingPublisher::default(),
        );

        let result = h.poller.invoke().await;

        assert_eq!(result.status_code, 500);
        assert_eq!(result.body, RETRIES_EXHAUSTED_MESSAGE);
        assert_eq!(h.source.calls(), 3);
        assert!(h.publisher.calls.lock().unwrap().is_empty());
        assert_eq!(
            *h.sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn test_poll_reports_exhaustion_detail() {
        let h = harness(
            ScriptedSource::new(vec![transient(), transient(), transient()]),
            RecordingPublisher::default(),
        );

        let failure = h.poller.poll().await.unwrap_err();
        assert!(matches!(
            failure,
            TaskFailure::RetriesExhausted {
                attempts: 3,
                last_error: AppError::Status { status: 503 }
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_results_publishes_nothing() {
        let h = harness(
            ScriptedSource::new(vec![Ok(br#"{"status": "ZERO_RESULTS"}"#.to_vec())]),
            RecordingPublisher::default(),
        );

        let result = h.poller.invoke().await;

        assert_eq!(result, InvocationResult::success(0));
        assert!(result.body.contains('0'));
        assert!(h.publisher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_halts_batch() {
        let h = harness(
            ScriptedSource::new(vec![Ok(body_with(3))]),
            RecordingPublisher {
                fail_on_call: Some(2),
                ..RecordingPublisher::default()
            },
        );

        let result = h.poller.invoke().await;

        assert_eq!(result.status_code, 500);
        assert_eq!(result.body, UNEXPECTED_ERROR_MESSAGE);
        assert_eq!(h.publisher.calls.lock().unwrap().len(), 2);
        assert_eq!(h.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_is_not_retried() {
        let h = harness(
            ScriptedSource::new(vec![Ok(b"<html>rate limited</html>".to_vec()), Ok(body_with(1))]),
            RecordingPublisher::default(),
        );

        let result = h.poller.invoke().await;

        assert_eq!(result, InvocationResult::unexpected_error());
        assert_eq!(h.source.calls(), 1);
        assert!(h.sleeper.delays.lock().unwrap().is_empty());
        assert!(h.publisher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_transient_fetch_error_is_unexpected() {
        let h = harness(
            ScriptedSource::new(vec![Err(AppError::malformed("bad"))]),
            RecordingPublisher::default(),
        );

        assert!(matches!(
            h.poller.poll().await,
            Err(TaskFailure::Unexpected(AppError::Malformed(_)))
        ));
        assert_eq!(h.source.calls(), 1);
    }

    #[tokio::test]
    async fn test_query_params_are_fixed() {
        let h = harness(
            ScriptedSource::new(vec![transient(), Ok(body_with(1))]),
            RecordingPublisher::default(),
        );

        h.poller.invoke().await;

        let expected = vec![
            ("query".to_string(), "restaurant in kajang".to_string()),
            ("key".to_string(), "test-key".to_string()),
        ];
        let params = h.source.params.lock().unwrap();
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|p| *p == expected));
    }

    #[tokio::test]
    async fn test_panic_becomes_unexpected_result() {
        let h = harness(
            ScriptedSource {
                panic: true,
                ..ScriptedSource::default()
            },
            RecordingPublisher::default(),
        );

        let result = h.poller.invoke().await;
        assert_eq!(result, InvocationResult::unexpected_error());
        assert!(h.publisher.calls.lock().unwrap().is_empty());
    }
}
