//! RelayBuilder - wiring of the ports into the dispatcher and entry points.
//!
//! Startup is fail-fast: a missing port or a queue that cannot be created is
//! reported by `build()`, before any message is received.

use std::sync::Arc;

use tracing::info;

use super::delivery_policy::DeliveryPolicy;
use super::dispatcher::Dispatcher;
use super::forwarder::ResultForwarder;
use super::poller::{PollSettings, Poller};
use super::push::PushHandler;
use crate::domain::RelayError;
use crate::impls::HttpInvoker;
use crate::ports::{Clock, MessageQueue, QueueProvider, RecordStore, RemoteInvoker, SystemClock};
use crate::settings::RelayConfig;

/// RelayBuilder assembles a [`Relay`].
///
/// # Example
/// ```ignore
/// let relay = RelayBuilder::new(config)
///     .with_record_store(store)
///     .with_queue_provider(queues)
///     .build()
///     .await?;
/// let handle = PollerHandle::spawn(relay.poller());
/// ```
///
/// invoker を指定しなければ endpoint 設定から [`HttpInvoker`] を作る。
/// clock のデフォルトは [`SystemClock`]。
pub struct RelayBuilder {
    config: RelayConfig,
    record_store: Option<Arc<dyn RecordStore>>,
    queue_provider: Option<Arc<dyn QueueProvider>>,
    invoker: Option<Arc<dyn RemoteInvoker>>,
    clock: Option<Arc<dyn Clock>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing port: {0}. Provide it before calling build().")]
    MissingPort(&'static str),

    #[error("failed to prepare queue: {0}")]
    Queue(#[source] RelayError),

    #[error("failed to create remote invoker: {0}")]
    Invoker(#[source] RelayError),
}

impl RelayBuilder {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            record_store: None,
            queue_provider: None,
            invoker: None,
            clock: None,
        }
    }

    pub fn with_record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store = Some(store);
        self
    }

    pub fn with_queue_provider(mut self, queues: Arc<dyn QueueProvider>) -> Self {
        self.queue_provider = Some(queues);
        self
    }

    pub fn with_invoker(mut self, invoker: Arc<dyn RemoteInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub async fn build(self) -> Result<Relay, BuildError> {
        let store = self
            .record_store
            .ok_or(BuildError::MissingPort("record store"))?;
        let queues = self
            .queue_provider
            .ok_or(BuildError::MissingPort("queue provider"))?;
        let invoker = match self.invoker {
            Some(invoker) => invoker,
            None => Arc::new(
                HttpInvoker::new(
                    self.config.http_timeout(),
                    self.config.subscription_key().map(str::to_owned),
                )
                .map_err(BuildError::Invoker)?,
            ),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let source = queues.queue(&self.config.queue.name);
        source.create_if_not_exists().await.map_err(BuildError::Queue)?;
        let poison = queues.queue(&self.config.poison_queue_name());
        poison.create_if_not_exists().await.map_err(BuildError::Queue)?;

        let policy = DeliveryPolicy::new(self.config.queue.max_dequeue_before_poison);
        let forwarder = ResultForwarder::new(queues, poison.clone());
        let dispatcher = Arc::new(Dispatcher::new(store, invoker, forwarder, policy, clock));

        info!(
            queue = source.name(),
            poison_queue = poison.name(),
            table = %self.config.table.name,
            max_deliveries = policy.max_deliveries,
            "relay assembled"
        );

        Ok(Relay {
            poller: Arc::new(Poller::new(
                source.clone(),
                dispatcher.clone(),
                PollSettings::from_config(&self.config),
            )),
            push: PushHandler::new(dispatcher.clone()),
            dispatcher,
            source,
            poison,
        })
    }
}

/// A fully wired relay. Both entry points share one dispatcher.
pub struct Relay {
    dispatcher: Arc<Dispatcher>,
    poller: Arc<Poller>,
    push: PushHandler,
    source: Arc<dyn MessageQueue>,
    poison: Arc<dyn MessageQueue>,
}

impl Relay {
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn poller(&self) -> Arc<Poller> {
        Arc::clone(&self.poller)
    }

    pub fn push_handler(&self) -> PushHandler {
        self.push.clone()
    }

    pub fn source_queue(&self) -> Arc<dyn MessageQueue> {
        Arc::clone(&self.source)
    }

    pub fn poison_queue(&self) -> Arc<dyn MessageQueue> {
        Arc::clone(&self.poison)
    }
}
