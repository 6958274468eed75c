//! Fintrack recurring scheduler.
//!
//! Loads the ledger from the configured snapshot file, periodically
//! materializes due recurring transactions, and writes the ledger back after
//! every run until interrupted.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use fintrack_db::{InMemoryStore, read_snapshot, write_snapshot};
use fintrack_engine::Engine;
use fintrack_shared::{AppConfig, telemetry};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init(&config.logging);

    let snapshot_path = config
        .store
        .snapshot_path
        .clone()
        .context("store.snapshot_path must be set (FINTRACK__STORE__SNAPSHOT_PATH)")?;
    let snapshot = read_snapshot(&snapshot_path)
        .with_context(|| format!("Failed to read snapshot {}", snapshot_path.display()))?;
    info!(
        path = %snapshot_path.display(),
        accounts = snapshot.accounts.len(),
        transactions = snapshot.transactions.len(),
        "Ledger snapshot loaded"
    );

    let store = Arc::new(InMemoryStore::from_snapshot(snapshot).context("Invalid snapshot")?);
    let engine = Engine::new(Arc::clone(&store), &config);
    info!(
        worker_id = %engine.recurring.worker_id(),
        poll_interval_secs = config.recurring.poll_interval_secs,
        max_catch_up = config.recurring.max_catch_up,
        "Recurring scheduler started"
    );

    let mut ticker = tokio::time::interval(config.recurring.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let result = engine.recurring.process_due_recurring(Utc::now()).await;
                // Failed runs may still have committed some occurrences.
                save(&store, &snapshot_path).await;
                match result {
                    Ok(_) => {}
                    Err(err) if err.is_fatal() => {
                        error!(error = %err, code = err.error_code(), "Stopping scheduler");
                        return Err(err.into());
                    }
                    Err(err) => {
                        warn!(error = %err, "Recurring run failed, will retry next tick");
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for shutdown signal")?;
                info!("Shutdown signal received");
                break;
            }
        }
    }

    let snapshot = store.snapshot().await;
    write_snapshot(&snapshot_path, &snapshot).context("Failed to save snapshot on shutdown")?;
    Ok(())
}

async fn save(store: &InMemoryStore, path: &Path) {
    let snapshot = store.snapshot().await;
    if let Err(err) = write_snapshot(path, &snapshot) {
        warn!(error = %err, path = %path.display(), "Failed to save snapshot");
    }
}
