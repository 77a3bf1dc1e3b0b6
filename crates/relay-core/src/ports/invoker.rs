//! RemoteInvoker port - one outbound call to the power-on endpoint.

use async_trait::async_trait;

use crate::domain::{CallEnvelope, InvocationFailure};
use crate::translate::WireDocument;

/// RemoteInvoker sends a translated document to the envelope's target URL.
///
/// Exactly one request per call: retries belong to the queue's redelivery,
/// never to the invoker.
#[async_trait]
pub trait RemoteInvoker: Send + Sync {
    /// Returns the raw response body on a success status.
    async fn invoke(
        &self,
        call: &CallEnvelope,
        document: &WireDocument,
    ) -> Result<String, InvocationFailure>;
}
