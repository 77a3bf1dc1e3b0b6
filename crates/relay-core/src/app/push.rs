//! PushHandler - the push-triggered entry point.
//!
//! The hosting infrastructure delivers one message per invocation and deletes
//! it when the invocation returns `Ok`. Returning `Err` makes it redeliver.
//! Dead-lettering uses the same [`DeliveryPolicy`](super::DeliveryPolicy) as
//! the poller, so both entry points give up after the same number of
//! deliveries.

use std::sync::Arc;

use super::dispatcher::{Dispatcher, Disposition};
use crate::domain::RelayError;
use crate::ports::QueueMessage;

#[derive(Clone)]
pub struct PushHandler {
    dispatcher: Arc<Dispatcher>,
}

impl PushHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn handle(&self, message: &QueueMessage) -> Result<(), RelayError> {
        match self.dispatcher.process(message).await {
            Disposition::Retry(err) => Err(err),
            Disposition::Completed | Disposition::Dropped(_) | Disposition::DeadLettered(_) => {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::delivery_policy::DeliveryPolicy;
    use crate::app::forwarder::ResultForwarder;
    use crate::domain::call::fixtures::sample_call;
    use crate::domain::{CallEnvelope, CallId, CallRecord, InvocationFailure};
    use crate::impls::{InMemoryQueueProvider, InMemoryRecordStore};
    use crate::ports::{QueueProvider, RemoteInvoker, SystemClock};
    use crate::translate::WireDocument;
    use async_trait::async_trait;
    use rstest::rstest;

    struct RefusingInvoker;

    #[async_trait]
    impl RemoteInvoker for RefusingInvoker {
        async fn invoke(
            &self,
            _call: &CallEnvelope,
            _document: &WireDocument,
        ) -> Result<String, InvocationFailure> {
            Err(InvocationFailure::transport("connection refused"))
        }
    }

    async fn handler() -> (PushHandler, Arc<InMemoryQueueProvider>) {
        let queues = Arc::new(InMemoryQueueProvider::new());
        let store = Arc::new(InMemoryRecordStore::new());
        store
            .insert(CallRecord::pending(
                CallId::from("call-1"),
                serde_json::to_string(&sample_call()).unwrap(),
            ))
            .await;
        let forwarder = ResultForwarder::new(queues.clone(), queues.queue("inbound-poison"));
        let dispatcher = Dispatcher::new(
            store,
            Arc::new(RefusingInvoker),
            forwarder,
            DeliveryPolicy::new(5),
            Arc::new(SystemClock),
        );
        (PushHandler::new(Arc::new(dispatcher)), queues)
    }

    fn delivery(body: &str, dequeue_count: u32) -> QueueMessage {
        QueueMessage {
            message_id: "m-1".to_string(),
            pop_receipt: "r-1".to_string(),
            body: body.to_string(),
            dequeue_count,
        }
    }

    #[rstest]
    #[case(1, true)]
    #[case(3, true)]
    #[case(4, false)]
    #[case(5, false)]
    #[tokio::test]
    async fn failure_redelivers_until_threshold(#[case] dequeue_count: u32, #[case] redeliver: bool) {
        let (handler, queues) = handler().await;

        let result = handler.handle(&delivery("call-1", dequeue_count)).await;

        assert_eq!(result.is_err(), redeliver);
        let dead = queues.get("inbound-poison").len();
        assert_eq!(dead, if redeliver { 0 } else { 1 });
    }

    #[tokio::test]
    async fn unknown_call_is_acknowledged() {
        let (handler, queues) = handler().await;

        handler.handle(&delivery("nope", 1)).await.unwrap();

        assert!(queues.get("inbound-poison").is_empty());
    }
}
