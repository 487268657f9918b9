//! Queued (v2) seat lifecycle path (C6, §4.5).
//!
//! Every event gets at most one worker per process, draining its three
//! priority streams strictly HIGH, then NORMAL, then LOW (the ordering
//! lives in [`PriorityQueue::read_next`]). A message is only ACKed after
//! the status registry has recorded its terminal outcome - a crash between
//! those two writes leaves the message pending for redelivery, at which
//! point the idempotency check in [`QueuedWorker::process`] sees the
//! already-terminal status and skips re-executing the primitive (§4.5,
//! §8).

use std::time::Instant;

use ticketing_core::{EventId, RequestId, SeatId, UserId};
use ticketing_coordination::{Delivery, Priority, PriorityQueue, RequestStatus, StatusRegistry};
use ticketing_postgres::PgStore;
use ticketing_runtime::QueueMetrics;
use tokio::sync::watch;

use crate::config::EngineConfig;

/// A single event's v2 worker: reads its streams, runs the requested
/// primitive against the durable store, and records the outcome.
pub struct QueuedWorker {
    store: PgStore,
    queue: PriorityQueue,
    status: StatusRegistry,
    config: EngineConfig,
    event_id: EventId,
    shutdown: watch::Receiver<bool>,
}

impl QueuedWorker {
    /// Builds a worker for one event. Call [`QueuedWorker::run`] on a
    /// spawned task to start draining.
    #[must_use]
    pub const fn new(
        store: PgStore,
        queue: PriorityQueue,
        status: StatusRegistry,
        config: EngineConfig,
        event_id: EventId,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            queue,
            status,
            config,
            event_id,
            shutdown,
        }
    }

    /// Drains this event's streams until the shutdown signal fires.
    pub async fn run(mut self) {
        let consumer = format!("worker-{}", self.event_id);
        tracing::info!(event_id = %self.event_id, "queued worker started");

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            match self
                .queue
                .read_next(self.event_id, &consumer, self.config.worker_block())
                .await
            {
                Ok(Some(delivery)) => self.process(delivery).await,
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(event_id = %self.event_id, error = %err, "queue read failed, backing off");
                    tokio::time::sleep(self.config.lock_retry_delay()).await;
                }
            }
        }

        tracing::info!(event_id = %self.event_id, "queued worker shutting down");
    }

    async fn process(&self, delivery: Delivery) {
        let request_id = delivery.message.request_id;
        let priority = delivery.message.priority;

        if let Ok(Some(record)) = self.status.get(request_id).await {
            if record.status.is_terminal() {
                tracing::info!(
                    request_id = %request_id,
                    "redelivered message already terminal, skipping re-execution"
                );
                self.ack(priority, &delivery).await;
                return;
            }
        }

        if let Err(err) = self
            .status
            .transition(request_id, RequestStatus::Processing, None, None)
            .await
        {
            tracing::warn!(request_id = %request_id, error = %err, "failed to mark request PROCESSING");
        }

        let started = Instant::now();
        let outcome = self.run_operation(&delivery.message).await;

        match outcome {
            Ok(result) => {
                QueueMetrics::record_processed(started.elapsed());
                if let Err(err) = self
                    .status
                    .transition(request_id, RequestStatus::Completed, None, Some(result))
                    .await
                {
                    tracing::error!(request_id = %request_id, error = %err, "failed to mark request COMPLETED");
                }
                self.ack(priority, &delivery).await;
            }
            Err(err) => {
                QueueMetrics::record_failed();
                let message = err.to_string();
                if let Err(status_err) = self
                    .status
                    .transition(request_id, RequestStatus::Failed, Some(message.clone()), None)
                    .await
                {
                    tracing::error!(request_id = %request_id, error = %status_err, "failed to mark request FAILED");
                }
                if let Err(dlq_err) = self.queue.dead_letter(&delivery, priority, &message).await {
                    tracing::error!(request_id = %request_id, error = %dlq_err, "failed to dead-letter message");
                }
            }
        }
    }

    async fn run_operation(
        &self,
        message: &ticketing_coordination::QueueMessage,
    ) -> Result<serde_json::Value, ticketing_core::CoreError> {
        let seat_ids: Vec<SeatId> = message.seat_ids.iter().map(|&id| SeatId::from_raw(id)).collect();

        let (reservations, total) = self
            .store
            .reserve(
                message.event_id,
                &seat_ids,
                &message.user_id,
                message.session_id.clone(),
                self.config.reservation_timeout(),
                self.config.max_seats_per_booking,
            )
            .await?;

        Ok(serde_json::json!({
            "reservations": reservations,
            "total_cents": total.cents(),
        }))
    }

    async fn ack(&self, priority: Priority, delivery: &Delivery) {
        if let Err(err) = self.queue.ack(self.event_id, priority, &delivery.entry_id).await {
            tracing::error!(entry_id = %delivery.entry_id, error = %err, "failed to ack message");
        }
    }
}

/// Builds and enqueues a v2 reservation request, recording its initial
/// `PENDING` status. Returns the request id the caller polls.
///
/// `priority` is the priority *already resolved* by the caller (the
/// facade's cross-check of the claimed priority against the premium
/// catalog, §4.5) - this function only stores and enqueues it.
///
/// # Errors
///
/// Returns [`ticketing_coordination::CoordinationError`] if the stream or
/// status registry cannot be reached.
pub async fn submit_reservation(
    queue: &PriorityQueue,
    status: &StatusRegistry,
    event_id: EventId,
    user_id: UserId,
    seat_ids: Vec<i64>,
    priority: Priority,
    session_id: Option<String>,
) -> Result<RequestId, ticketing_coordination::CoordinationError> {
    let request_id = RequestId::new();
    let message = ticketing_coordination::QueueMessage {
        request_id,
        event_id,
        user_id,
        seat_ids,
        priority,
        session_id,
        enqueued_at: chrono::Utc::now(),
        metadata: serde_json::json!({ "operation": "reserve" }),
    };

    queue.enqueue(&message).await?;
    status.record_pending(request_id).await?;
    QueueMetrics::record_enqueued(priority_label(priority));

    Ok(request_id)
}

const fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Normal => "normal",
        Priority::Low => "low",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_label_matches_drain_order_names() {
        assert_eq!(priority_label(Priority::High), "high");
        assert_eq!(priority_label(Priority::Normal), "normal");
        assert_eq!(priority_label(Priority::Low), "low");
    }
}
