//! Places provider payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// Provider statuses that mean the query itself was served.
const HEALTHY_STATUSES: [&str; 2] = ["OK", "ZERO_RESULTS"];

/// A single place returned by the provider.
///
/// Opaque: the poller never looks inside, it only re-serializes the value
/// as received (field order included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceRecord(Value);

impl PlaceRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Serialize to the UTF-8 JSON payload sent to the stream.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Parsed text-search response envelope.
#[derive(Debug, Clone, Default)]
pub struct TextSearchResponse {
    /// Records under `results`; empty when the key is absent
    pub results: Vec<PlaceRecord>,

    /// Provider-level status (`OK`, `ZERO_RESULTS`, `REQUEST_DENIED`, ...)
    pub status: Option<String>,

    /// Provider-supplied explanation for a failed status
    pub error_message: Option<String>,

    /// Whether the provider offered a further page
    pub has_next_page: bool,
}

impl TextSearchResponse {
    /// Parse a response body.
    ///
    /// The body must be a JSON object. `results`, when present, must be a
    /// list; when absent, there are simply no records.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        let Value::Object(mut envelope) = value else {
            return Err(AppError::malformed("response body is not a JSON object"));
        };

        let results = match envelope.remove("results") {
            None => Vec::new(),
            Some(Value::Array(items)) => items.into_iter().map(PlaceRecord::new).collect(),
            Some(other) => {
                return Err(AppError::malformed(format!(
                    "'results' is not a list (got {})",
                    json_kind(&other)
                )));
            }
        };

        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            results,
            status: text(envelope.get("status")),
            error_message: text(envelope.get("error_message")),
            has_next_page: envelope.contains_key("next_page_token"),
        })
    }

    /// True unless the provider reported an error status.
    pub fn is_healthy(&self) -> bool {
        self.status
            .as_deref()
            .is_none_or(|s| HEALTHY_STATUSES.contains(&s))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
