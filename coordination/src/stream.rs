//! Per-event priority streams and dead-letter queue (C6, §4.5, §6.2).
//!
//! Three append-only Redis streams exist per event, one per priority level:
//! `ticketing:queue:<event_id>:<priority>`. A single logical consumer per
//! event drains them in strict descending priority order (HIGH, then
//! NORMAL, then LOW) through one shared consumer group, `workers`. Draining
//! strictly by priority is what gives v2 its preemption behaviour (§4.5,
//! scenario E6): the next message read after the in-flight one completes is
//! always the highest-priority message currently enqueued, never simply the
//! next one in arrival order.

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ticketing_core::{EventId, RequestId, UserId};

use crate::error::{CoordinationError, Result};

const CONSUMER_GROUP: &str = "workers";
const DEAD_LETTER_STREAM: &str = "ticketing:dlq";

/// Priority level of a v2 request. HIGH is reserved for verified premium
/// principals; a caller-declared HIGH is demoted to NORMAL unless the
/// facade (C9) has independently verified the principal against its own
/// catalog (§4.5) - that verification happens above this crate, which only
/// stores and drains whatever priority it is handed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// VIP/premium fast lane.
    High,
    /// Default priority.
    Normal,
    /// Background/batch operations; drained last and may, in theory, starve
    /// under sustained HIGH/NORMAL load (§4.5 - accepted risk).
    Low,
}

impl Priority {
    /// Priorities in the strict drain order a worker polls them.
    pub const DRAIN_ORDER: [Self; 3] = [Self::High, Self::Normal, Self::Low];

    const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

/// A single v2 request as it travels through the stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueMessage {
    /// Client-polled handle for this request.
    pub request_id: RequestId,
    /// Event the request targets.
    pub event_id: EventId,
    /// Authenticated principal.
    pub user_id: UserId,
    /// Seats requested (interpretation depends on `operation`).
    pub seat_ids: Vec<i64>,
    /// Priority this message was actually enqueued under (post-demotion).
    pub priority: Priority,
    /// Optional client session identifier.
    pub session_id: Option<String>,
    /// Enqueue time.
    pub enqueued_at: DateTime<Utc>,
    /// Free-form metadata the facade attached (e.g. which operation to run).
    pub metadata: serde_json::Value,
}

/// A message read off a stream, paired with the stream entry id needed to
/// ACK it.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// The stream entry id (used for ACK/XCLAIM).
    pub entry_id: String,
    /// The decoded message body.
    pub message: QueueMessage,
}

/// Handle onto the three priority streams for one event, plus the shared
/// dead-letter stream.
#[derive(Clone)]
pub struct PriorityQueue {
    conn: ConnectionManager,
}

impl PriorityQueue {
    /// Wraps a Redis connection manager.
    #[must_use]
    pub const fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn stream_key(event_id: EventId, priority: Priority) -> String {
        format!("ticketing:queue:{event_id}:{}", priority.as_str())
    }

    /// Ensures the consumer group exists on a stream, creating both the
    /// stream and the group if neither exists yet. Idempotent.
    async fn ensure_group(&self, stream_key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<()> = conn
            .xgroup_create_mkstream(stream_key, CONSUMER_GROUP, "0")
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(CoordinationError::Unavailable(e.to_string())),
        }
    }

    /// Appends `message` to the stream for its own priority level.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Unavailable`] if the store cannot be
    /// reached, or [`CoordinationError::Malformed`] if the message fails to
    /// serialize.
    pub async fn enqueue(&self, message: &QueueMessage) -> Result<String> {
        let stream_key = Self::stream_key(message.event_id, message.priority);
        self.ensure_group(&stream_key).await?;

        let payload = serde_json::to_string(message)
            .map_err(|e| CoordinationError::Malformed(e.to_string()))?;

        let mut conn = self.conn.clone();
        let entry_id: String = conn
            .xadd(&stream_key, "*", &[("payload", payload.as_str())])
            .await
            .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

        Ok(entry_id)
    }

    /// Reads the next undelivered message for `event_id`, trying HIGH, then
    /// NORMAL, then LOW, blocking up to `block` on each priority in turn
    /// before falling through to the next. Returns `None` if all three
    /// streams were empty for the full `block` window, letting the worker
    /// loop check its shutdown signal (§5).
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Unavailable`] if the store cannot be
    /// reached, or [`CoordinationError::Malformed`] if a delivered message
    /// fails to deserialize.
    pub async fn read_next(
        &self,
        event_id: EventId,
        consumer: &str,
        block: Duration,
    ) -> Result<Option<Delivery>> {
        let per_priority_block = block / Priority::DRAIN_ORDER.len() as u32;

        for priority in Priority::DRAIN_ORDER {
            let stream_key = Self::stream_key(event_id, priority);
            self.ensure_group(&stream_key).await?;

            if let Some(delivery) = self
                .read_one(&stream_key, consumer, per_priority_block)
                .await?
            {
                return Ok(Some(delivery));
            }
        }

        Ok(None)
    }

    async fn read_one(
        &self,
        stream_key: &str,
        consumer: &str,
        block: Duration,
    ) -> Result<Option<Delivery>> {
        use redis::streams::{StreamReadOptions, StreamReadReply};

        #[allow(clippy::cast_possible_truncation)]
        let block_ms = block.as_millis() as usize;

        let opts = StreamReadOptions::default()
            .group(CONSUMER_GROUP, consumer)
            .count(1)
            .block(block_ms);

        let mut conn = self.conn.clone();
        let reply: StreamReadReply = conn
            .xread_options(&[stream_key], &[">"], &opts)
            .await
            .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

        for stream_key_reply in reply.keys {
            for entry in stream_key_reply.ids {
                let payload: String = entry
                    .map
                    .get("payload")
                    .and_then(|v| match v {
                        redis::Value::BulkString(bytes) => {
                            String::from_utf8(bytes.clone()).ok()
                        }
                        _ => None,
                    })
                    .ok_or_else(|| {
                        CoordinationError::Malformed("stream entry missing payload".to_string())
                    })?;

                let message: QueueMessage = serde_json::from_str(&payload)
                    .map_err(|e| CoordinationError::Malformed(e.to_string()))?;

                return Ok(Some(Delivery {
                    entry_id: entry.id,
                    message,
                }));
            }
        }

        Ok(None)
    }

    /// Acknowledges a delivered message, removing it from the consumer
    /// group's pending entries list. Per §4.5, this must only be called
    /// after the status registry has recorded a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Unavailable`] if the store cannot be
    /// reached.
    pub async fn ack(&self, event_id: EventId, priority: Priority, entry_id: &str) -> Result<()> {
        let stream_key = Self::stream_key(event_id, priority);
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .xack(&stream_key, CONSUMER_GROUP, &[entry_id])
            .await
            .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;
        Ok(())
    }

    /// Moves a message to the dead-letter stream with its error text, then
    /// ACKs the original so the consumer proceeds (§4.5).
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Unavailable`] if the store cannot be
    /// reached.
    pub async fn dead_letter(
        &self,
        delivery: &Delivery,
        priority: Priority,
        error: &str,
    ) -> Result<()> {
        let payload = serde_json::to_string(&delivery.message)
            .map_err(|e| CoordinationError::Malformed(e.to_string()))?;

        let mut conn = self.conn.clone();
        let _: String = conn
            .xadd(
                DEAD_LETTER_STREAM,
                "*",
                &[("payload", payload.as_str()), ("error", error)],
            )
            .await
            .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

        self.ack(delivery.message.event_id, priority, &delivery.entry_id)
            .await
    }

    /// Returns `(stream length, pending-unacked count)` for one priority
    /// level of one event, used by `GET /v2/queue/stats/{event_id}`.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Unavailable`] if the store cannot be
    /// reached.
    pub async fn stats(&self, event_id: EventId, priority: Priority) -> Result<QueueStats> {
        let stream_key = Self::stream_key(event_id, priority);
        let mut conn = self.conn.clone();

        let len: u64 = conn
            .xlen(&stream_key)
            .await
            .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

        let pending: redis::streams::StreamPendingReply = conn
            .xpending(&stream_key, CONSUMER_GROUP)
            .await
            .unwrap_or(redis::streams::StreamPendingReply::Empty);

        let pending_count = match pending {
            redis::streams::StreamPendingReply::Data(data) => data.count,
            redis::streams::StreamPendingReply::Empty => 0,
        };

        Ok(QueueStats {
            priority,
            length: len,
            pending: pending_count as u64,
        })
    }
}

/// Length and pending count for one priority stream of one event.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct QueueStats {
    /// Priority level these stats describe.
    pub priority: Priority,
    /// Total entries ever appended (stream length).
    pub length: u64,
    /// Entries delivered to a consumer but not yet ACKed.
    pub pending: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_order_is_high_normal_low() {
        assert_eq!(
            Priority::DRAIN_ORDER,
            [Priority::High, Priority::Normal, Priority::Low]
        );
    }

    #[test]
    fn stream_key_is_namespaced_per_event_and_priority() {
        let key = PriorityQueue::stream_key(EventId::from_raw(7), Priority::High);
        assert_eq!(key, "ticketing:queue:7:high");
    }
}
