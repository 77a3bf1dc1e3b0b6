//! Call record: the persisted row a queue message points at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::call::CallEnvelope;
use super::errors::RelayError;
use super::ids::CallId;

/// Every call record lives under this partition key; the call id is the row key.
pub const PARTITION_KEY: &str = "symxCall";

/// Lifecycle status as seen by consumers polling the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Pending,
    Processed,
    Error,
}

impl CallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Processed => "processed",
            CallStatus::Error => "error",
        }
    }
}

/// Opaque optimistic-concurrency token issued by the store on every write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Typed view of the record-store entity.
///
/// Columns: `Call`, `Attempts`, `LastUpdatedUtc`, `Status`, `Response`.
/// `version` is the token read with the row and must accompany its update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: CallId,

    /// Serialized [`CallEnvelope`] produced upstream.
    pub call: Option<String>,

    /// `None` until the first processing attempt is recorded.
    pub attempts: Option<u32>,

    pub last_updated_utc: Option<DateTime<Utc>>,

    pub status: Option<CallStatus>,

    /// Raw remote response, or the JSON error outcome.
    pub response: Option<String>,

    #[serde(default)]
    pub version: VersionToken,
}

impl CallRecord {
    /// A freshly queued record, as the upstream producer writes it.
    pub fn pending(call_id: CallId, call: impl Into<String>) -> Self {
        Self {
            call_id,
            call: Some(call.into()),
            attempts: None,
            last_updated_utc: None,
            status: Some(CallStatus::Pending),
            response: None,
            version: VersionToken::default(),
        }
    }

    /// Decode the stored envelope.
    ///
    /// A missing, blank or undecodable `Call` column is a
    /// [`RelayError::MalformedRecordPayload`].
    pub fn call_envelope(&self) -> Result<CallEnvelope, RelayError> {
        let raw = self
            .call
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .ok_or_else(|| RelayError::MalformedRecordPayload {
                call_id: self.call_id.clone(),
                reason: "`Call` property is missing or empty".to_string(),
            })?;

        serde_json::from_str(raw).map_err(|e| RelayError::MalformedRecordPayload {
            call_id: self.call_id.clone(),
            reason: format!("`Call` property is not a valid call envelope: {e}"),
        })
    }

    /// Attempt number the next recorded outcome will carry (first = 1).
    pub fn next_attempt(&self) -> u32 {
        self.attempts.map_or(1, |n| n.saturating_add(1))
    }
}
