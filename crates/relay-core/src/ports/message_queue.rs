//! MessageQueue port - a durable queue with visibility leases.
//!
//! The queue carries call ids only; state and payloads live in the record
//! store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::RelayError;

/// A message received under a visibility lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: String,

    /// Receipt of the current lease; required to delete the message.
    pub pop_receipt: String,

    /// Opaque body. For the source queue this is the call id.
    pub body: String,

    /// Deliveries so far, including this one (first delivery = 1).
    pub dequeue_count: u32,
}

/// MessageQueue is a single named queue.
///
/// # Contract
/// - `receive` hides each returned message for `visibility`; a message that
///   is not deleted before the lease expires becomes receivable again with a
///   higher `dequeue_count`.
/// - `delete` only succeeds with the pop receipt of the latest lease.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    fn name(&self) -> &str;

    async fn create_if_not_exists(&self) -> Result<(), RelayError>;

    async fn receive(
        &self,
        max_messages: usize,
        visibility: Duration,
    ) -> Result<Vec<QueueMessage>, RelayError>;

    async fn delete(&self, message: &QueueMessage) -> Result<(), RelayError>;

    async fn send(&self, body: &str) -> Result<(), RelayError>;
}

/// QueueProvider resolves queues by name (callback and dead-letter queues are
/// only known at runtime).
pub trait QueueProvider: Send + Sync {
    fn queue(&self, name: &str) -> Arc<dyn MessageQueue>;
}
