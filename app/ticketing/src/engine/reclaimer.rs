//! Periodic reclaimer driver (C8, §4.7).
//!
//! Ticks on a fixed interval, calling [`PgStore::reclaim_expired`] and
//! recording how many holds it released. A failed tick is logged and
//! retried on the next firing rather than treated as fatal - a single
//! missed tick just means expired holds linger a little longer before
//! being reclaimed.

use std::time::Instant;

use ticketing_postgres::PgStore;
use ticketing_runtime::ReclaimerMetrics;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;

/// Spawns the reclaimer loop, returning its join handle.
pub fn spawn(store: PgStore, config: EngineConfig, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.reclaimer_interval());
        tracing::info!(interval = ?config.reclaimer_interval(), "reclaimer started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let started = Instant::now();
                    match store.reclaim_expired().await {
                        Ok(reclaimed) => {
                            ReclaimerMetrics::record_tick(reclaimed, started.elapsed());
                            if reclaimed > 0 {
                                tracing::info!(reclaimed, "reclaimed expired holds");
                            }
                        }
                        Err(err) => tracing::error!(error = %err, "reclaimer tick failed"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("reclaimer shutting down");
    })
}
