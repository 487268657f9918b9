//! Request-status registry (C7, §4.6) and its subscription interface (§6.3).
//!
//! Each v2 request gets a hash record at `ticketing:status:<request_id>`
//! with a 24h TTL. Status transitions follow the lattice
//! `PENDING -> PROCESSING -> {COMPLETED, FAILED}`; writers must not regress
//! it, which this type enforces with a read-then-write check in
//! [`StatusRegistry::transition`]. This is best-effort, not atomic: there is
//! no `WATCH`/`MULTI` around the GET and the SET, so two callers racing on
//! the same `request_id` could both pass the check before either writes.
//! Callers rely on a single request id having at most one in-flight writer
//! (the queue worker that owns it) rather than on this check alone.

use std::time::Duration;

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use ticketing_core::RequestId;

use crate::error::{CoordinationError, Result};

const STATUS_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Lifecycle status of a v2 request (§4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Enqueued, not yet picked up by a worker.
    Pending,
    /// A worker has picked this message up and is running the primitive.
    Processing,
    /// The primitive committed successfully.
    Completed,
    /// The primitive failed, or the message was dead-lettered.
    Failed,
}

impl RequestStatus {
    /// Rank in the lattice `PENDING(0) -> PROCESSING(1) -> {COMPLETED,
    /// FAILED}(2)`. Two statuses of equal rank (`COMPLETED`/`FAILED`) are
    /// both terminal and neither may overwrite the other.
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Whether this status is terminal; reaching it closes any open
    /// subscription (§6.3).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A snapshot of a request's current status, as observed by a poller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Current status.
    pub status: RequestStatus,
    /// Human-readable message (e.g. the error text on `FAILED`).
    pub message: Option<String>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
    /// Result payload, set once the request reaches a terminal status.
    pub result: Option<serde_json::Value>,
}

/// Status registry backed by the coordination store.
#[derive(Clone)]
pub struct StatusRegistry {
    conn: ConnectionManager,
}

impl StatusRegistry {
    /// Wraps a Redis connection manager.
    #[must_use]
    pub const fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn redis_key(request_id: RequestId) -> String {
        format!("ticketing:status:{request_id}")
    }

    /// Writes the initial `PENDING` record for a freshly enqueued request.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Unavailable`] if the store cannot be
    /// reached.
    pub async fn record_pending(&self, request_id: RequestId) -> Result<()> {
        self.write_unconditional(
            request_id,
            &StatusRecord {
                status: RequestStatus::Pending,
                message: None,
                updated_at: Utc::now(),
                result: None,
            },
        )
        .await
    }

    /// Reads the current record, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Unavailable`] if the store cannot be
    /// reached, or [`CoordinationError::Malformed`] if the stored payload
    /// fails to deserialize.
    pub async fn get(&self, request_id: RequestId) -> Result<Option<StatusRecord>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(Self::redis_key(request_id))
            .await
            .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

        match raw {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| CoordinationError::Malformed(e.to_string())),
        }
    }

    /// Advances the status, enforcing the monotonic lattice: a write whose
    /// rank is not strictly greater than the current record's rank is
    /// rejected rather than applied.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::StatusRegression`] if `status` would
    /// not move the record forward along the lattice, or
    /// [`CoordinationError::Unavailable`] if the store cannot be reached.
    pub async fn transition(
        &self,
        request_id: RequestId,
        status: RequestStatus,
        message: Option<String>,
        result: Option<serde_json::Value>,
    ) -> Result<()> {
        if let Some(current) = self.get(request_id).await? {
            if status.rank() <= current.status.rank() {
                return Err(CoordinationError::StatusRegression {
                    request_id: request_id.to_string(),
                    current: format!("{:?}", current.status),
                    attempted: format!("{status:?}"),
                });
            }
        }

        self.write_unconditional(
            request_id,
            &StatusRecord {
                status,
                message,
                updated_at: Utc::now(),
                result,
            },
        )
        .await
    }

    async fn write_unconditional(&self, request_id: RequestId, record: &StatusRecord) -> Result<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| CoordinationError::Malformed(e.to_string()))?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::redis_key(request_id), json, STATUS_TTL_SECONDS)
            .await
            .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;
        Ok(())
    }

    /// Polls the registry every `interval` and yields a snapshot each time
    /// the status changes, closing after a terminal status is observed
    /// (§6.3). This is the polling alternative to pub/sub the spec calls
    /// "an acceptable alternative but not required"; genuine push delivery
    /// is the external WebSocket layer's job, out of scope here (§1).
    pub fn subscribe(
        &self,
        request_id: RequestId,
        interval: Duration,
    ) -> tokio::sync::mpsc::Receiver<StatusRecord> {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let registry = self.clone();

        tokio::spawn(async move {
            let mut last_status: Option<RequestStatus> = None;
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;
                let Ok(Some(record)) = registry.get(request_id).await else {
                    continue;
                };

                if last_status != Some(record.status) {
                    last_status = Some(record.status);
                    let terminal = record.status.is_terminal();
                    if tx.send(record).await.is_err() {
                        return;
                    }
                    if terminal {
                        return;
                    }
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_rank_is_monotonic_by_construction() {
        assert!(RequestStatus::Pending.rank() < RequestStatus::Processing.rank());
        assert!(RequestStatus::Processing.rank() < RequestStatus::Completed.rank());
        assert_eq!(RequestStatus::Completed.rank(), RequestStatus::Failed.rank());
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Processing.is_terminal());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Failed.is_terminal());
    }
}
