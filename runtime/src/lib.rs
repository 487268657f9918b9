//! Ambient resilience and observability plumbing for the ticketing engine.
//!
//! This crate holds the concerns that sit beside the seat lifecycle engine
//! rather than inside it: circuit breaking around the coordination store and
//! the durable store, exponential-backoff retry (used by infra health checks
//! and anywhere a transient failure should be absorbed rather than surfaced),
//! and the Prometheus metrics recorders every other crate in the workspace
//! calls into.
//!
//! None of these types know what a seat or a reservation is - they are
//! generic infrastructure primitives, reused unchanged from operation to
//! operation. The seat lifecycle engine's own retry discipline (bounded
//! lock-acquisition retries per §4.4) lives in `ticketing-coordination`
//! instead, since it is governed by the distinct `LOCK_MAX_RETRIES` /
//! `LOCK_RETRY_DELAY_MS` configuration rather than this crate's generic
//! backoff policy.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod metrics;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
pub use metrics::{
    CircuitBreakerMetrics, LockMetrics, MetricsServer, QueueMetrics, ReclaimerMetrics,
    RetryMetrics, SeatLifecycleMetrics,
};
pub use retry::{retry_with_backoff, retry_with_predicate, RetryPolicy};
