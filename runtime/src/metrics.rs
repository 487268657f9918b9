//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for the components that make up
//! the seat lifecycle engine:
//! - Seat lifecycle operations (reserve/book/confirm/fail/cancel/extend)
//! - Distributed mutex acquisitions and contention
//! - Queued-path enqueue/consume/dead-letter activity
//! - Reclaimer ticks
//! - Circuit breaker state
//! - Retry attempts
//!
//! # Example
//!
//! ```rust,no_run
//! use ticketing_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Start metrics server on port 9090
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start().await?;
//!
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP server
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Initialize metrics and start the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns error if metrics exporter cannot be installed or server cannot bind.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this will fail
    /// with `MetricsError::Install`. In production, ensure this is only called once.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        // Register all metric descriptions
        register_metrics();

        // Build and install the Prometheus exporter
        let builder = PrometheusBuilder::new()
            // Configure histogram buckets for latency measurements
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        // Try to install the recorder
        // In tests, this may fail if a recorder is already installed
        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(
                    addr = %self.addr,
                    "Metrics server started - available at http://{}/metrics",
                    self.addr
                );
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    // In tests, multiple MetricsServer instances may be created
                    // We'll allow this but warn about it
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Seat lifecycle metrics (C4)
    describe_counter!(
        "seat_lifecycle_operations_total",
        "Total number of seat lifecycle operations attempted, by operation"
    );
    describe_counter!(
        "seat_lifecycle_errors_total",
        "Total number of seat lifecycle operations that failed, by error kind"
    );
    describe_histogram!(
        "seat_lifecycle_operation_duration_seconds",
        "Time taken to execute a seat lifecycle operation's transaction"
    );

    // Distributed mutex metrics (C3)
    describe_counter!(
        "lock_acquisitions_total",
        "Total number of distributed mutex acquisitions that succeeded"
    );
    describe_counter!(
        "lock_contended_total",
        "Total number of distributed mutex acquisition attempts that found the key held"
    );
    describe_counter!(
        "lock_retries_exhausted_total",
        "Total number of multi_lock acquisitions that exhausted their retry budget"
    );
    describe_histogram!(
        "lock_acquisition_duration_seconds",
        "Time taken to acquire the full set of keys in a multi_lock call"
    );

    // Queued path metrics (C6)
    describe_counter!(
        "queue_enqueued_total",
        "Total number of requests enqueued, by event and priority"
    );
    describe_counter!(
        "queue_processed_total",
        "Total number of queued requests that completed successfully"
    );
    describe_counter!(
        "queue_failed_total",
        "Total number of queued requests that failed and were dead-lettered"
    );
    describe_histogram!(
        "queue_processing_duration_seconds",
        "Time a single queued request spent being processed by its worker"
    );
    describe_gauge!(
        "queue_workers_active",
        "Number of per-event workers currently running in this process"
    );

    // Reclaimer metrics (C8)
    describe_counter!(
        "reclaimer_ticks_total",
        "Total number of reclaimer ticks executed"
    );
    describe_counter!(
        "reclaimer_seats_reclaimed_total",
        "Total number of seats returned to AVAILABLE by the reclaimer"
    );
    describe_histogram!(
        "reclaimer_tick_duration_seconds",
        "Time taken to execute one reclaimer tick"
    );

    // Circuit Breaker Metrics
    describe_gauge!(
        "circuit_breaker_state",
        "Current circuit breaker state (0=closed, 1=half-open, 2=open)"
    );
    describe_counter!(
        "circuit_breaker_calls_total",
        "Total number of calls through circuit breaker"
    );
    describe_counter!(
        "circuit_breaker_successes_total",
        "Total number of successful calls"
    );
    describe_counter!(
        "circuit_breaker_failures_total",
        "Total number of failed calls"
    );
    describe_counter!(
        "circuit_breaker_rejections_total",
        "Total number of rejected calls (circuit open)"
    );

    // Retry Metrics
    describe_counter!("retry_attempts_total", "Total number of retry attempts");
    describe_counter!("retry_successes_total", "Total number of successful retries");
    describe_counter!(
        "retry_exhausted_total",
        "Total number of retry attempts that exhausted max retries"
    );
}

/// Seat lifecycle engine metrics recorder (C4).
pub struct SeatLifecycleMetrics;

impl SeatLifecycleMetrics {
    /// Record a completed operation and how long its transaction took.
    pub fn record_operation(name: &'static str, duration: Duration) {
        counter!("seat_lifecycle_operations_total", "operation" => name).increment(1);
        histogram!("seat_lifecycle_operation_duration_seconds", "operation" => name)
            .record(duration.as_secs_f64());
    }

    /// Record a failed operation by the core error code that was raised.
    pub fn record_error(name: &'static str, error_code: &'static str) {
        counter!("seat_lifecycle_errors_total", "operation" => name, "error" => error_code)
            .increment(1);
    }
}

/// Distributed mutex metrics recorder (C3).
pub struct LockMetrics;

impl LockMetrics {
    /// Record a successful acquisition of the full key set.
    pub fn record_acquired(duration: Duration) {
        counter!("lock_acquisitions_total").increment(1);
        histogram!("lock_acquisition_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a single key found already held.
    pub fn record_contended() {
        counter!("lock_contended_total").increment(1);
    }

    /// Record a `multi_lock` call that exhausted its retry budget.
    pub fn record_retries_exhausted() {
        counter!("lock_retries_exhausted_total").increment(1);
    }
}

/// Queued path metrics recorder (C6).
pub struct QueueMetrics;

impl QueueMetrics {
    /// Record a request appended to a priority stream.
    pub fn record_enqueued(priority: &'static str) {
        counter!("queue_enqueued_total", "priority" => priority).increment(1);
    }

    /// Record a request that completed successfully, and how long it took.
    pub fn record_processed(duration: Duration) {
        counter!("queue_processed_total").increment(1);
        histogram!("queue_processing_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a request that was dead-lettered.
    pub fn record_failed() {
        counter!("queue_failed_total").increment(1);
    }

    /// Record the current number of live per-event workers in this process.
    pub fn record_workers_active(count: usize) {
        #[allow(clippy::cast_precision_loss)]
        gauge!("queue_workers_active").set(count as f64);
    }
}

/// Reclaimer metrics recorder (C8).
pub struct ReclaimerMetrics;

impl ReclaimerMetrics {
    /// Record a completed tick: how many seats it reclaimed and how long it took.
    pub fn record_tick(reclaimed: usize, duration: Duration) {
        counter!("reclaimer_ticks_total").increment(1);
        counter!("reclaimer_seats_reclaimed_total").increment(reclaimed as u64);
        histogram!("reclaimer_tick_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Circuit breaker metrics recorder.
pub struct CircuitBreakerMetrics;

impl CircuitBreakerMetrics {
    /// Record circuit breaker state.
    ///
    /// 0 = Closed, 1 = `HalfOpen`, 2 = Open
    pub fn record_state(state: f64) {
        gauge!("circuit_breaker_state").set(state);
    }

    /// Record a call attempt.
    pub fn record_call() {
        counter!("circuit_breaker_calls_total").increment(1);
    }

    /// Record a successful call.
    pub fn record_success() {
        counter!("circuit_breaker_successes_total").increment(1);
    }

    /// Record a failed call.
    pub fn record_failure() {
        counter!("circuit_breaker_failures_total").increment(1);
    }

    /// Record a rejected call (circuit open).
    pub fn record_rejection() {
        counter!("circuit_breaker_rejections_total").increment(1);
    }
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a retry attempt.
    pub fn record_attempt() {
        counter!("retry_attempts_total").increment(1);
    }

    /// Record a successful retry.
    pub fn record_success() {
        counter!("retry_successes_total").increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted() {
        counter!("retry_exhausted_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
    }

    #[tokio::test]
    async fn test_metrics_server_start() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);

        let result = server.start();
        assert!(result.is_ok());
        // Note: handle might be None if another test already initialized the recorder
        // This is OK - the recorder is still installed globally
    }

    #[tokio::test]
    async fn test_seat_lifecycle_metrics() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        SeatLifecycleMetrics::record_operation("reserve", Duration::from_millis(12));
        SeatLifecycleMetrics::record_error("reserve", "UNAVAILABLE");

        if let Some(rendered) = server.render() {
            assert!(rendered.contains("seat_lifecycle_operations_total"));
            assert!(rendered.contains("seat_lifecycle_errors_total"));
        }
    }

    #[tokio::test]
    async fn test_queue_metrics() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        QueueMetrics::record_enqueued("high");
        QueueMetrics::record_processed(Duration::from_millis(30));
        QueueMetrics::record_failed();
        QueueMetrics::record_workers_active(3);

        if let Some(rendered) = server.render() {
            assert!(rendered.contains("queue_enqueued_total"));
            assert!(rendered.contains("queue_processed_total"));
        }
    }

    #[tokio::test]
    async fn test_circuit_breaker_metrics() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        CircuitBreakerMetrics::record_call();
        CircuitBreakerMetrics::record_success();
        CircuitBreakerMetrics::record_state(0.0);

        if let Some(rendered) = server.render() {
            assert!(rendered.contains("circuit_breaker_calls_total"));
        }
    }

    #[tokio::test]
    async fn test_retry_metrics() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let mut server = MetricsServer::new(addr);
        server.start().unwrap();

        RetryMetrics::record_attempt();
        RetryMetrics::record_success();

        if let Some(rendered) = server.render() {
            assert!(rendered.contains("retry_attempts_total"));
        }
    }
}
