//! Poller - the batched polling entry point.
//!
//! One long-running loop per process. Each batch is processed strictly
//! sequentially; a panic while processing one message is contained to that
//! message and goes through the same delivery-count escalation as any other
//! failure.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::dispatcher::{Dispatcher, Disposition};
use crate::domain::RelayError;
use crate::ports::{MessageQueue, QueueMessage};
use crate::settings::RelayConfig;

/// Pause after a failed receive.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub batch_size: usize,
    pub visibility: Duration,
    /// Idle sleep when a receive returns nothing.
    pub poll_delay: Duration,
    pub error_backoff: Duration,
}

impl PollSettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            batch_size: config.queue.batch_size,
            visibility: config.visibility_timeout(),
            poll_delay: config.poll_delay(),
            error_backoff: ERROR_BACKOFF,
        }
    }
}

/// Tally of one `run_once` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub received: usize,
    pub completed: usize,
    pub dropped: usize,
    pub dead_lettered: usize,
    /// Not deleted: retry, failed delete, or skipped because of shutdown.
    pub left_in_queue: usize,
}

impl BatchReport {
    fn tally(&mut self, disposition: &Disposition) {
        match disposition {
            Disposition::Completed => self.completed += 1,
            Disposition::Dropped(_) => self.dropped += 1,
            Disposition::DeadLettered(_) => self.dead_lettered += 1,
            Disposition::Retry(_) => self.left_in_queue += 1,
        }
    }
}

pub struct Poller {
    source: Arc<dyn MessageQueue>,
    dispatcher: Arc<Dispatcher>,
    settings: PollSettings,
}

impl Poller {
    pub fn new(
        source: Arc<dyn MessageQueue>,
        dispatcher: Arc<Dispatcher>,
        settings: PollSettings,
    ) -> Self {
        Self {
            source,
            dispatcher,
            settings,
        }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Receive and process a single batch.
    ///
    /// Only a failed receive is an error; every per-message failure is
    /// handled inside and shows up in the report.
    pub async fn run_once(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<BatchReport, RelayError> {
        let messages = self
            .source
            .receive(self.settings.batch_size, self.settings.visibility)
            .await?;

        let mut report = BatchReport {
            received: messages.len(),
            ..BatchReport::default()
        };

        for (index, message) in messages.iter().enumerate() {
            if stop_requested(shutdown) {
                let skipped = messages.len() - index;
                info!(skipped, "shutdown requested; leaving rest of batch");
                report.left_in_queue += skipped;
                break;
            }

            let disposition = self.handle(message).await;
            if disposition.acknowledges() {
                if let Err(err) = self.source.delete(message).await {
                    if matches!(disposition, Disposition::DeadLettered(_)) {
                        // the poison copy stays; the next delivery publishes another one
                        error!(
                            call_id = %message.body,
                            message_id = %message.message_id,
                            dequeue_count = message.dequeue_count,
                            error = %err,
                            "dead-lettered message could not be deleted; poison queue may receive a duplicate"
                        );
                    } else {
                        error!(
                            call_id = %message.body,
                            message_id = %message.message_id,
                            error = %err,
                            "failed to delete message from source queue"
                        );
                    }
                    report.left_in_queue += 1;
                    continue;
                }
            }
            report.tally(&disposition);
        }

        Ok(report)
    }

    /// Poll until shutdown is requested or the shutdown sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            queue = self.source.name(),
            batch_size = self.settings.batch_size,
            "queue reader started"
        );

        while !stop_requested(&shutdown) {
            let pause = match self.run_once(&shutdown).await {
                Ok(report) if report.received == 0 => self.settings.poll_delay,
                Ok(report) => {
                    debug!(?report, "batch processed");
                    continue;
                }
                Err(err) => {
                    error!(error = %err, backoff = ?self.settings.error_backoff, "queue poll failed");
                    self.settings.error_backoff
                }
            };

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(queue = self.source.name(), "queue reader stopping");
    }

    /// Process one message in its own task so a panic cannot take the loop
    /// down with it. The task is always awaited to completion.
    async fn handle(&self, message: &QueueMessage) -> Disposition {
        let dispatcher = Arc::clone(&self.dispatcher);
        let owned = message.clone();
        match tokio::spawn(async move { dispatcher.process(&owned).await }).await {
            Ok(disposition) => disposition,
            Err(join_err) => {
                let err = RelayError::Other(format!("message processing panicked: {join_err}"));
                self.dispatcher.escalate_aborted(message, err).await
            }
        }
    }
}

fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Handle to a spawned [`Poller`].
/// - handle を drop すると sender も drop され、ループが止まる
/// - `shutdown_and_join()` は処理中のメッセージの完了を待つ
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn spawn(poller: Arc<Poller>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            poller.run(shutdown_rx).await;
        });
        Self { shutdown_tx, join }
    }

    /// Stop taking new messages. The message in flight is finished first.
    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        if let Err(err) = self.join.await {
            error!(error = %err, "queue reader task failed");
        }
    }
}
