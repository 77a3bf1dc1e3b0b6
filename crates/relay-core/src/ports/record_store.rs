//! RecordStore port - keyed access to call records.

use async_trait::async_trait;

use crate::domain::{CallId, CallRecord, RelayError, VersionToken};

/// RecordStore reads and replaces call records under the fixed partition key.
///
/// # Contract
/// - `get` returns [`RelayError::RecordNotFound`] for an unknown call id.
/// - `update` replaces the whole row only if the stored version still equals
///   `expected`; otherwise it returns [`RelayError::PersistenceConflict`] and
///   leaves the row untouched. On success it returns the new version.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, call_id: &CallId) -> Result<CallRecord, RelayError>;

    async fn update(
        &self,
        record: &CallRecord,
        expected: &VersionToken,
    ) -> Result<VersionToken, RelayError>;
}
