//! Per-process registry of live per-event v2 workers (§5).
//!
//! The shared-resource policy requires at most one worker draining a given
//! event's streams within this process; a second `ensure_worker` call for
//! an event already running is a no-op. Across processes, the stream's
//! single consumer group plus Redis's own delivery semantics are what keep
//! messages from being processed twice (§4.5), not this registry - this
//! registry only avoids wasting a process's own task budget on duplicate
//! workers.

use std::collections::HashMap;
use std::sync::Arc;

use ticketing_core::EventId;
use ticketing_coordination::{PriorityQueue, StatusRegistry};
use ticketing_postgres::PgStore;
use ticketing_runtime::QueueMetrics;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::engine::queued::QueuedWorker;

/// Spawns and tracks one [`QueuedWorker`] task per event.
pub struct WorkerRegistry {
    store: PgStore,
    queue: PriorityQueue,
    status: StatusRegistry,
    config: EngineConfig,
    shutdown: watch::Receiver<bool>,
    workers: Mutex<HashMap<EventId, JoinHandle<()>>>,
}

impl WorkerRegistry {
    /// Builds an empty registry. Workers are spawned lazily via
    /// [`WorkerRegistry::ensure_worker`].
    #[must_use]
    pub fn new(
        store: PgStore,
        queue: PriorityQueue,
        status: StatusRegistry,
        config: EngineConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            queue,
            status,
            config,
            shutdown,
            workers: Mutex::new(HashMap::new()),
        })
    }

    /// Ensures a worker is running for `event_id`, spawning one if none is
    /// currently alive.
    pub async fn ensure_worker(&self, event_id: EventId) {
        let mut workers = self.workers.lock().await;

        if let Some(handle) = workers.get(&event_id) {
            if !handle.is_finished() {
                return;
            }
        }

        let worker = QueuedWorker::new(
            self.store.clone(),
            self.queue.clone(),
            self.status.clone(),
            self.config.clone(),
            event_id,
            self.shutdown.clone(),
        );
        let handle = tokio::spawn(worker.run());
        workers.insert(event_id, handle);

        QueueMetrics::record_workers_active(workers.len());
    }
}
