//! Dispatcher - the relay pipeline for one queue message.
//!
//! # Flow
//! 1. RecordStore::get() with the message body as call id
//! 2. decode the stored envelope
//! 3. translate() into the wire document
//! 4. RemoteInvoker::invoke()
//! 5. OutcomeRecorder::record() (success and invocation failure alike)
//! 6. success: forward the raw response to the callback queue
//! 7. failure: DeliveryPolicy decides between redelivery and the poison queue
//!
//! The dispatcher never touches the source queue. It returns a
//! [`Disposition`] and the entry point (poller or push adapter) turns that
//! into a delete, a successful return, or nothing.

use std::sync::Arc;

use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};

use super::delivery_policy::DeliveryPolicy;
use super::forwarder::ResultForwarder;
use super::recorder::OutcomeRecorder;
use crate::domain::{AttemptResult, CallId, CallOutcome, ErrorKind, RelayError};
use crate::ports::{Clock, QueueMessage, RecordStore, RemoteInvoker};
use crate::translate::translate;

/// What the entry point must do with the source message.
#[derive(Debug)]
pub enum Disposition {
    /// Relayed and forwarded. Remove from the source queue.
    Completed,

    /// Can never succeed (unknown or malformed record). Remove without
    /// dead-lettering.
    Dropped(RelayError),

    /// Failed; leave it for the queue's own redelivery.
    Retry(RelayError),

    /// Failed for the last allowed time and published to the poison queue.
    /// Remove from the source queue.
    DeadLettered(RelayError),
}

impl Disposition {
    /// Whether the source message must be deleted / acknowledged.
    pub fn acknowledges(&self) -> bool {
        !matches!(self, Disposition::Retry(_))
    }
}

pub struct Dispatcher {
    store: Arc<dyn RecordStore>,
    invoker: Arc<dyn RemoteInvoker>,
    recorder: OutcomeRecorder,
    forwarder: ResultForwarder,
    policy: DeliveryPolicy,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        invoker: Arc<dyn RemoteInvoker>,
        forwarder: ResultForwarder,
        policy: DeliveryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            recorder: OutcomeRecorder::new(store.clone(), clock.clone()),
            store,
            invoker,
            forwarder,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Run one message through the pipeline.
    pub async fn process(&self, message: &QueueMessage) -> Disposition {
        let call_id = CallId::from(message.body.as_str());

        async {
            info!("received call message");
            match self.relay(&call_id).await {
                Ok(()) => Disposition::Completed,
                Err(err) => self.escalate(message, err).await,
            }
        }
        .instrument(message_span(message))
        .await
    }

    /// Escalate a failure that escaped [`Dispatcher::process`] (its task
    /// panicked), under a fresh `relay_message` span.
    ///
    /// The correlation id is read back from the record when it still decodes;
    /// a failed lookup only leaves the field empty.
    pub async fn escalate_aborted(&self, message: &QueueMessage, err: RelayError) -> Disposition {
        let span = message_span(message);
        let call_id = CallId::from(message.body.as_str());
        if let Ok(call) = self
            .store
            .get(&call_id)
            .await
            .and_then(|record| record.call_envelope())
        {
            span.record("correlation_id", field::display(&call.correlation_id));
        }

        async {
            error!(error = %err, "message processing aborted");
            self.escalate(message, err).await
        }
        .instrument(span)
        .await
    }

    /// Route a failed message: drop it, leave it, or dead-letter it.
    ///
    /// Also used by the poller for failures that happen outside
    /// [`Dispatcher::process`] (a panicking attempt).
    pub async fn escalate(&self, message: &QueueMessage, err: RelayError) -> Disposition {
        if err.kind() == ErrorKind::Permanent {
            error!(error = %err, "message cannot be processed; acknowledging without retry");
            return Disposition::Dropped(err);
        }

        if !self.policy.should_dead_letter(message.dequeue_count) {
            warn!(
                error = %err,
                dequeue_count = message.dequeue_count,
                max_deliveries = self.policy.max_deliveries,
                "processing failed; leaving message for redelivery"
            );
            return Disposition::Retry(err);
        }

        error!(
            error = %err,
            dequeue_count = message.dequeue_count,
            max_deliveries = self.policy.max_deliveries,
            "processing failed on final delivery"
        );
        match self.forwarder.dead_letter(message).await {
            Ok(()) => Disposition::DeadLettered(err),
            Err(dead_letter_err) => {
                error!(error = %dead_letter_err, "failed to publish to poison queue");
                Disposition::Retry(err)
            }
        }
    }

    async fn relay(&self, call_id: &CallId) -> Result<(), RelayError> {
        let record = self.store.get(call_id).await?;
        let call = record.call_envelope()?;
        Span::current().record("correlation_id", field::display(&call.correlation_id));
        info!(attempt = record.next_attempt(), "processing call");

        let document = translate(&call.soap)?;
        debug!(soap = %document.as_str(), "converted SOAP message");

        let result = match self.invoker.invoke(&call, &document).await {
            Ok(response) => {
                info!(len = response.len(), "power-on endpoint call succeeded");
                AttemptResult::Success { response }
            }
            Err(failure) => {
                error!(
                    status_code = failure.status_code,
                    error = %failure,
                    "power-on endpoint call failed"
                );
                let outcome = CallOutcome::error(&call, &failure, self.clock.now());
                AttemptResult::Failure { failure, outcome }
            }
        };

        self.recorder.record(record, &result).await?;

        match result {
            AttemptResult::Success { response } => {
                self.forwarder
                    .forward_success(&call.callback_queue, &response)
                    .await
            }
            AttemptResult::Failure { failure, .. } => Err(RelayError::Invocation(failure)),
        }
    }
}

fn message_span(message: &QueueMessage) -> Span {
    info_span!(
        "relay_message",
        call_id = %message.body,
        message_id = %message.message_id,
        dequeue_count = message.dequeue_count,
        correlation_id = field::Empty,
    )
}
