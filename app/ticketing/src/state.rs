//! Application state shared across every ticketing HTTP handler.

use std::sync::Arc;

use axum::extract::FromRef;
use ticketing_coordination::{PriorityQueue, StatusRegistry};

use crate::catalog::PremiumCatalog;
use crate::config::Config;
use crate::engine::{ImmediateEngine, WorkerRegistry};

/// Shared state handed to every Axum handler in this crate.
#[derive(Clone)]
pub struct AppState {
    /// Immediate (v1) seat lifecycle engine.
    pub immediate: Arc<ImmediateEngine>,
    /// Queued-path primitives (v2 enqueue side).
    pub queue: PriorityQueue,
    /// Request-status registry (v2 poll side).
    pub status: StatusRegistry,
    /// Per-event v2 worker registry.
    pub workers: Arc<WorkerRegistry>,
    /// Verified premium/VIP principals.
    pub premium_catalog: Arc<PremiumCatalog>,
    /// Effective application configuration.
    pub config: Arc<Config>,
}

impl FromRef<AppState> for Arc<ImmediateEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.immediate.clone()
    }
}

impl FromRef<AppState> for Arc<WorkerRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.workers.clone()
    }
}
