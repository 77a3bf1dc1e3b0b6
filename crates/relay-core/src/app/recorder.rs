//! OutcomeRecorder - the single write-of-record for each processing attempt.

use std::sync::Arc;

use tracing::info;

use crate::domain::{AttemptResult, CallRecord, CallStatus, RelayError};
use crate::ports::{Clock, RecordStore};

pub struct OutcomeRecorder {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl OutcomeRecorder {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Stamp `record` with the attempt's result and write it back under the
    /// version it was read with.
    ///
    /// Increments `Attempts` by exactly one. A concurrent writer surfaces as
    /// [`RelayError::PersistenceConflict`]; nothing is retried here.
    pub async fn record(
        &self,
        mut record: CallRecord,
        result: &AttemptResult,
    ) -> Result<CallRecord, RelayError> {
        let expected = record.version.clone();
        let status = if result.is_success() {
            CallStatus::Processed
        } else {
            CallStatus::Error
        };

        record.attempts = Some(record.next_attempt());
        record.last_updated_utc = Some(self.clock.now());
        record.status = Some(status);
        record.response = Some(result.response_payload());

        record.version = self.store.update(&record, &expected).await?;
        info!(
            call_id = %record.call_id,
            attempts = record.attempts,
            status = status.as_str(),
            "recorded call outcome"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::fixtures::sample_call;
    use crate::domain::{CallId, CallOutcome, InvocationFailure};
    use crate::impls::InMemoryRecordStore;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    fn fixture() -> (Arc<InMemoryRecordStore>, OutcomeRecorder) {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        let recorder = OutcomeRecorder::new(store.clone(), Arc::new(clock));
        (store, recorder)
    }

    fn success() -> AttemptResult {
        AttemptResult::Success {
            response: "<ok/>".to_string(),
        }
    }

    #[tokio::test]
    async fn success_marks_processed_with_raw_response() {
        let (store, recorder) = fixture();
        let record = store
            .insert(CallRecord::pending(CallId::from("call-1"), "{}"))
            .await;

        recorder.record(record, &success()).await.unwrap();

        let stored = store.get(&CallId::from("call-1")).await.unwrap();
        assert_eq!(stored.attempts, Some(1));
        assert_eq!(stored.status, Some(CallStatus::Processed));
        assert_eq!(stored.response.as_deref(), Some("<ok/>"));
        assert_eq!(
            stored.last_updated_utc,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn failure_marks_error_with_outcome_json() {
        let (store, recorder) = fixture();
        let record = store
            .insert(CallRecord::pending(CallId::from("call-1"), "{}"))
            .await;
        let failure = InvocationFailure::status(500, "Internal Server Error");
        let outcome = CallOutcome::error(&sample_call(), &failure, Utc::now());

        recorder
            .record(record, &AttemptResult::Failure { failure, outcome })
            .await
            .unwrap();

        let stored = store.get(&CallId::from("call-1")).await.unwrap();
        assert_eq!(stored.status, Some(CallStatus::Error));
        let v: serde_json::Value =
            serde_json::from_str(stored.response.as_deref().unwrap()).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["httpStatusCode"], 500);
    }

    #[tokio::test]
    async fn each_recording_increments_attempts_by_one() {
        let (store, recorder) = fixture();
        let record = store
            .insert(CallRecord::pending(CallId::from("call-1"), "{}"))
            .await;

        let first = recorder.record(record, &success()).await.unwrap();
        assert_eq!(first.attempts, Some(1));
        let second = recorder.record(first, &success()).await.unwrap();
        assert_eq!(second.attempts, Some(2));

        let stored = store.get(&CallId::from("call-1")).await.unwrap();
        assert_eq!(stored.attempts, Some(2));
    }

    #[tokio::test]
    async fn stale_record_is_a_conflict_and_not_written() {
        let (store, recorder) = fixture();
        let record = store
            .insert(CallRecord::pending(CallId::from("call-1"), "{}"))
            .await;
        let stale = record.clone();

        recorder.record(record, &success()).await.unwrap();
        let err = recorder.record(stale, &success()).await.unwrap_err();

        assert!(matches!(err, RelayError::PersistenceConflict(_)));
        let stored = store.get(&CallId::from("call-1")).await.unwrap();
        assert_eq!(stored.attempts, Some(1));
    }
}
