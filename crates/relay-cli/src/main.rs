//! relay - runs the polling entry point of the call relay.
//!
//! Usage:
//!   relay
//!   relay --config relay.toml
//!   relay --seed call.json --seed other-call.json
//!
//! Queue and record store are the in-memory implementations; `--seed` loads
//! call envelopes into them so a local run has something to relay.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use relay_core::app::{PollerHandle, RelayBuilder};
use relay_core::domain::{CallEnvelope, CallRecord};
use relay_core::impls::{InMemoryQueueProvider, InMemoryRecordStore};
use relay_core::ports::MessageQueue;
use relay_core::settings::RelayConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Relays queued power-on calls to the remote endpoint")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file (default: ./relay.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON call envelope to store and enqueue before polling starts
    #[arg(long)]
    seed: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let config = RelayConfig::from_env(args.config.as_deref())
        .context("failed to load relay configuration")?;
    info!(
        queue = %config.queue.name,
        table = %config.table.name,
        "configuration loaded"
    );

    let store = Arc::new(InMemoryRecordStore::new());
    let queues = Arc::new(InMemoryQueueProvider::new());
    let relay = RelayBuilder::new(config)
        .with_record_store(store.clone())
        .with_queue_provider(queues)
        .build()
        .await
        .context("failed to assemble relay")?;

    let source = relay.source_queue();
    for path in &args.seed {
        seed(&store, source.as_ref(), path).await?;
    }

    let handle = PollerHandle::spawn(relay.poller());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("received shutdown signal");

    handle.shutdown_and_join().await;
    info!("relay stopped");
    Ok(())
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Store one call record as the upstream producer would, then enqueue its id.
async fn seed(store: &InMemoryRecordStore, source: &dyn MessageQueue, path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let call: CallEnvelope = serde_json::from_str(&raw)
        .with_context(|| format!("seed file {} is not a call envelope", path.display()))?;
    let call_id = call.call_id.clone();

    store.insert(CallRecord::pending(call_id.clone(), raw)).await;
    source
        .send(call_id.as_str())
        .await
        .with_context(|| format!("failed to enqueue call {call_id}"))?;
    info!(%call_id, path = %path.display(), "seeded call");
    Ok(())
}
