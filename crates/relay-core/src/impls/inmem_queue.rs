//! InMemoryQueue - development queue with visibility leases.
//!
//! Mirrors the lease semantics of a hosted storage queue closely enough for
//! the relay's retry policy to behave the same way:
//! - receive hides a message until its lease expires
//! - every receive bumps `dequeue_count` and rotates the pop receipt
//! - delete needs the pop receipt of the latest lease

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ulid::Ulid;

use crate::domain::RelayError;
use crate::ports::{MessageQueue, QueueMessage, QueueProvider};

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    dequeue_count: u32,
    pop_receipt: Option<String>,
    visible_at: Instant,
}

/// InMemoryQueue is a single named queue.
///
/// # Example
/// ```ignore
/// let queue = InMemoryQueue::new("deposit-inbound");
/// queue.send("call-1").await?;
/// let batch = queue.receive(16, Duration::from_secs(60)).await?;
/// queue.delete(&batch[0]).await?;
/// ```
pub struct InMemoryQueue {
    name: String,
    messages: Mutex<VecDeque<StoredMessage>>,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Mutex::new(VecDeque::new()),
        }
    }

    /// Messages still in the queue, visible or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Bodies of every message still in the queue, in enqueue order.
    pub fn bodies(&self) -> Vec<String> {
        self.lock().iter().map(|m| m.body.clone()).collect()
    }

    /// Make every leased message visible again, as if all leases had expired.
    pub fn expire_leases(&self) {
        let now = Instant::now();
        for message in self.lock().iter_mut() {
            message.visible_at = now;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<StoredMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_if_not_exists(&self) -> Result<(), RelayError> {
        Ok(())
    }

    async fn receive(
        &self,
        max_messages: usize,
        visibility: Duration,
    ) -> Result<Vec<QueueMessage>, RelayError> {
        let now = Instant::now();
        let mut messages = self.lock();
        let received = messages
            .iter_mut()
            .filter(|m| m.visible_at <= now)
            .take(max_messages)
            .map(|m| {
                let receipt = Ulid::new().to_string();
                m.dequeue_count += 1;
                m.pop_receipt = Some(receipt.clone());
                m.visible_at = now + visibility;
                QueueMessage {
                    message_id: m.message_id.clone(),
                    pop_receipt: receipt,
                    body: m.body.clone(),
                    dequeue_count: m.dequeue_count,
                }
            })
            .collect();
        Ok(received)
    }

    async fn delete(&self, message: &QueueMessage) -> Result<(), RelayError> {
        let mut messages = self.lock();
        let position = messages.iter().position(|m| {
            m.message_id == message.message_id
                && m.pop_receipt.as_deref() == Some(message.pop_receipt.as_str())
        });
        match position {
            Some(index) => {
                messages.remove(index);
                Ok(())
            }
            None => Err(RelayError::queue(
                &self.name,
                format!(
                    "message {} not found or pop receipt is stale",
                    message.message_id
                ),
            )),
        }
    }

    async fn send(&self, body: &str) -> Result<(), RelayError> {
        self.lock().push_back(StoredMessage {
            message_id: Ulid::new().to_string(),
            body: body.to_string(),
            dequeue_count: 0,
            pop_receipt: None,
            visible_at: Instant::now(),
        });
        Ok(())
    }
}

/// InMemoryQueueProvider hands out named queues, creating them on first use.
#[derive(Default)]
pub struct InMemoryQueueProvider {
    queues: Mutex<HashMap<String, Arc<InMemoryQueue>>>,
}

impl InMemoryQueueProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete handle, for inspection in tests and local runs.
    pub fn get(&self, name: &str) -> Arc<InMemoryQueue> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemoryQueue::new(name)))
            .clone()
    }
}

impl QueueProvider for InMemoryQueueProvider {
    fn queue(&self, name: &str) -> Arc<dyn MessageQueue> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEASE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn send_receive_delete_roundtrip() {
        let queue = InMemoryQueue::new("q");
        queue.send("call-1").await.unwrap();

        let batch = queue.receive(16, LEASE).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].body, "call-1");
        assert_eq!(batch[0].dequeue_count, 1);

        queue.delete(&batch[0]).await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn leased_messages_are_invisible() {
        let queue = InMemoryQueue::new("q");
        queue.send("call-1").await.unwrap();

        assert_eq!(queue.receive(16, LEASE).await.unwrap().len(), 1);
        assert!(queue.receive(16, LEASE).await.unwrap().is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn expired_lease_redelivers_with_higher_count() {
        let queue = InMemoryQueue::new("q");
        queue.send("call-1").await.unwrap();

        let first = queue.receive(16, LEASE).await.unwrap();
        queue.expire_leases();
        let second = queue.receive(16, LEASE).await.unwrap();

        assert_eq!(second[0].message_id, first[0].message_id);
        assert_eq!(second[0].dequeue_count, 2);
        assert_ne!(second[0].pop_receipt, first[0].pop_receipt);
    }

    #[tokio::test]
    async fn stale_pop_receipt_cannot_delete() {
        let queue = InMemoryQueue::new("q");
        queue.send("call-1").await.unwrap();

        let first = queue.receive(16, LEASE).await.unwrap();
        queue.expire_leases();
        let _second = queue.receive(16, LEASE).await.unwrap();

        assert!(queue.delete(&first[0]).await.is_err());
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn receive_respects_batch_size() {
        let queue = InMemoryQueue::new("q");
        for i in 0..20 {
            queue.send(&format!("call-{i}")).await.unwrap();
        }

        let batch = queue.receive(16, LEASE).await.unwrap();
        assert_eq!(batch.len(), 16);
        assert_eq!(batch[0].body, "call-0");
        assert_eq!(queue.receive(16, LEASE).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn provider_returns_the_same_queue_per_name() {
        let provider = InMemoryQueueProvider::new();
        provider.queue("cb-1").send("hello").await.unwrap();

        assert_eq!(provider.get("cb-1").bodies(), vec!["hello".to_string()]);
        assert!(provider.get("cb-2").is_empty());
    }
}
