//! InMemoryRecordStore - development record store with optimistic concurrency.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{CallId, CallRecord, RelayError, VersionToken};
use crate::ports::RecordStore;

struct Rows {
    records: HashMap<CallId, CallRecord>,
    /// Source of version tokens; every write takes the next value.
    next_version: u64,
}

impl Rows {
    fn issue_version(&mut self) -> VersionToken {
        self.next_version += 1;
        VersionToken::new(format!("W/\"{}\"", self.next_version))
    }
}

/// InMemoryRecordStore keeps one row per call id.
pub struct InMemoryRecordStore {
    rows: Mutex<Rows>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Rows {
                records: HashMap::new(),
                next_version: 0,
            }),
        }
    }

    /// Insert or overwrite a row unconditionally (the upstream producer's
    /// write). Returns the stored record with its issued version.
    pub async fn insert(&self, mut record: CallRecord) -> CallRecord {
        let mut rows = self.rows.lock().await;
        record.version = rows.issue_version();
        rows.records.insert(record.call_id.clone(), record.clone());
        record
    }

    /// Number of writes the store has accepted, inserts included.
    pub async fn write_count(&self) -> u64 {
        self.rows.lock().await.next_version
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(&self, call_id: &CallId) -> Result<CallRecord, RelayError> {
        self.rows
            .lock()
            .await
            .records
            .get(call_id)
            .cloned()
            .ok_or_else(|| RelayError::RecordNotFound(call_id.clone()))
    }

    async fn update(
        &self,
        record: &CallRecord,
        expected: &VersionToken,
    ) -> Result<VersionToken, RelayError> {
        let mut rows = self.rows.lock().await;
        let current = rows
            .records
            .get(&record.call_id)
            .ok_or_else(|| RelayError::RecordNotFound(record.call_id.clone()))?;
        if &current.version != expected {
            return Err(RelayError::PersistenceConflict(record.call_id.clone()));
        }

        let version = rows.issue_version();
        let mut stored = record.clone();
        stored.version = version.clone();
        rows.records.insert(stored.call_id.clone(), stored);
        Ok(version)
    }
}
