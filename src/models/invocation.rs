//! Invocation result returned to the caller.

use serde::{Deserialize, Serialize};

pub const RETRIES_EXHAUSTED_MESSAGE: &str =
    "Failed to retrieve data from Google Places API after multiple attempts.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error occurred.";

/// Outcome of one fetch-and-publish cycle, shaped as
/// `{"statusCode": int, "body": string}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResult {
    pub fn success(published: usize) -> Self {
        Self {
            status_code: 200,
            body: format!("Successfully pushed {published} records to Kinesis."),
        }
    }

    pub fn retries_exhausted() -> Self {
        Self {
            status_code: 500,
            body: RETRIES_EXHAUSTED_MESSAGE.to_string(),
        }
    }

    pub fn unexpected_error() -> Self {
        Self {
            status_code: 500,
            body: UNEXPECTED_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}
