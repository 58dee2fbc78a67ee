//! Scan loop
//!
//! Wires the log source and the detection engine together: an immediate
//! scan at startup, then one per configured interval. The on-demand rescan
//! route calls the same [`Scanner::run_once`]; the engine's batch lock
//! keeps the two paths from racing on the risk state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::detection::{DetectionEngine, EngineError};
use crate::models::Alert;
use crate::persistence::{PersistenceError, StateStore};

/// Errors from the upstream log-fetch API
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("log fetch failed: {0}")]
    Fetch(String),
}

/// Upstream log-fetch API. Absence of a checkpoint means "fetch a recent
/// default window".
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch_logs(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Value>, SourceError>;
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] PersistenceError),
}

pub struct Scanner {
    source: Arc<dyn LogSource>,
    engine: Arc<DetectionEngine>,
    store: Arc<dyn StateStore>,
    interval: Duration,
}

impl Scanner {
    pub fn new(
        source: Arc<dyn LogSource>,
        engine: Arc<DetectionEngine>,
        store: Arc<dyn StateStore>,
        scan_interval_seconds: u64,
    ) -> Self {
        Scanner {
            source,
            engine,
            store,
            interval: Duration::from_secs(scan_interval_seconds),
        }
    }

    /// Fetch everything since the last checkpoint and run it through the
    /// detection engine. A fetch failure aborts this attempt without
    /// touching persisted state.
    pub async fn run_once(&self) -> Result<Vec<Alert>, ScanError> {
        let since = self.store.load_state()?.last_checkpoint;
        log::info!(
            "Running scan. since={}",
            since.map(|t| t.to_rfc3339()).unwrap_or_else(|| "none".to_string())
        );

        let logs = self.source.fetch_logs(since).await?;
        let alerts = self.engine.process_logs(&logs).await?;

        log::info!("Scan completed: {} new alerts", alerts.len());
        Ok(alerts)
    }

    /// Scan immediately, then on every interval tick until shutdown. Scan
    /// failures are logged and retried on the next tick.
    pub async fn run_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        log::error!("Scheduled scan failed: {}", e);
                    }
                }
                _ = shutdown.changed() => {
                    log::info!("Scan loop stopping");
                    break;
                }
            }
        }
    }
}
