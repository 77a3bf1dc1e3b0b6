//! Outcome model: what a single processing attempt produced.
//!
//! On success the remote's raw response is stored and forwarded untouched, so
//! the structured [`CallOutcome`] only materialises on the error path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::call::CallEnvelope;
use super::errors::InvocationFailure;
use super::ids::{CallId, CorrelationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Structured outcome persisted into `Response` when an invocation fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOutcome {
    pub status: OutcomeStatus,

    /// `null` when the failure happened before any response arrived.
    pub http_status_code: Option<u16>,

    pub timestamp: DateTime<Utc>,

    pub message: String,

    #[serde(rename = "symxCallId")]
    pub call_id: CallId,

    pub correlation_id: CorrelationId,
}

impl CallOutcome {
    pub fn error(call: &CallEnvelope, failure: &InvocationFailure, at: DateTime<Utc>) -> Self {
        Self {
            status: OutcomeStatus::Error,
            http_status_code: failure.status_code,
            timestamp: at,
            message: failure.message.clone(),
            call_id: call.call_id.clone(),
            correlation_id: call.correlation_id.clone(),
        }
    }

    pub fn to_json(&self) -> String {
        // only plain strings, numbers and a timestamp: serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Result of one invocation, ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptResult {
    Success { response: String },
    Failure {
        failure: InvocationFailure,
        outcome: CallOutcome,
    },
}

impl AttemptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptResult::Success { .. })
    }

    /// Payload written to the record's `Response` column.
    pub fn response_payload(&self) -> String {
        match self {
            AttemptResult::Success { response } => response.clone(),
            AttemptResult::Failure { outcome, .. } => outcome.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::fixtures::sample_call;
    use chrono::TimeZone;

    #[test]
    fn error_outcome_serializes_with_camel_case_names() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let outcome = CallOutcome::error(
            &sample_call(),
            &InvocationFailure::status(502, "Bad Gateway"),
            at,
        );

        let v: serde_json::Value = serde_json::from_str(&outcome.to_json()).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["httpStatusCode"], 502);
        assert_eq!(v["message"], "Bad Gateway");
        assert_eq!(v["symxCallId"], "call-1");
        assert_eq!(v["correlationId"], "corr-1");
        assert_eq!(v["timestamp"], "2024-01-01T12:00:00Z");
    }

    #[test]
    fn missing_status_code_serializes_as_null() {
        let outcome = CallOutcome::error(
            &sample_call(),
            &InvocationFailure::transport("connection refused"),
            Utc::now(),
        );
        let v: serde_json::Value = serde_json::from_str(&outcome.to_json()).unwrap();
        assert!(v["httpStatusCode"].is_null());
    }

    #[test]
    fn success_payload_is_the_raw_response() {
        let result = AttemptResult::Success {
            response: "<ok/>".to_string(),
        };
        assert!(result.is_success());
        assert_eq!(result.response_payload(), "<ok/>");
    }
}
