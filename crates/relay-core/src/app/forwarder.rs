//! ResultForwarder - routes results onward.
//!
//! Success responses go to the call's own callback queue; messages that
//! exhausted their deliveries go, unchanged, to the source queue's poison
//! queue.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::RelayError;
use crate::ports::{MessageQueue, QueueMessage, QueueProvider};

pub struct ResultForwarder {
    queues: Arc<dyn QueueProvider>,
    dead_letter: Arc<dyn MessageQueue>,
}

impl ResultForwarder {
    pub fn new(queues: Arc<dyn QueueProvider>, dead_letter: Arc<dyn MessageQueue>) -> Self {
        Self {
            queues,
            dead_letter,
        }
    }

    /// Publish the raw response onto `callback`, creating the queue if absent.
    pub async fn forward_success(&self, callback: &str, response: &str) -> Result<(), RelayError> {
        if callback.trim().is_empty() {
            return Err(RelayError::queue(callback, "callback queue name is empty"));
        }
        let queue = self.queues.queue(callback);
        queue.create_if_not_exists().await?;
        queue.send(response).await?;
        info!(callback, len = response.len(), "forwarded response to callback queue");
        Ok(())
    }

    /// Publish the original message body onto the dead-letter queue.
    pub async fn dead_letter(&self, message: &QueueMessage) -> Result<(), RelayError> {
        self.dead_letter.send(&message.body).await?;
        warn!(
            message_id = %message.message_id,
            dead_letter_queue = self.dead_letter.name(),
            "moved message to poison queue"
        );
        Ok(())
    }
}
