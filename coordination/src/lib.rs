//! Ephemeral coordination primitives backing the distributed mutex (C3),
//! the per-event priority streams (C6) and the request-status registry
//! (C7) - collectively C2 in §2.
//!
//! This crate is the only shared mutable state between processes (§5): the
//! durable store (`ticketing-postgres`) holds the system of record, but
//! cross-process contention is arbitrated here, either through lease locks
//! (v1) or through the stream's single-consumer-per-event guarantee (v2).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod lock;
pub mod status_registry;
pub mod stream;

pub use error::{CoordinationError, Result};
pub use lock::{DistributedMutex, LockGuard};
pub use status_registry::{RequestStatus, StatusRecord, StatusRegistry};
pub use stream::{Delivery, Priority, PriorityQueue, QueueMessage, QueueStats};

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::Client;

/// Connects to the coordination store and hands back the three primitives
/// built on top of it, sharing a single connection manager.
///
/// # Errors
///
/// Returns [`CoordinationError::Unavailable`] if the initial connection
/// cannot be established.
pub async fn connect(
    redis_url: &str,
    lock_ttl: Duration,
) -> Result<(DistributedMutex, PriorityQueue, StatusRegistry)> {
    let client =
        Client::open(redis_url).map_err(|e| CoordinationError::Unavailable(e.to_string()))?;
    let conn = ConnectionManager::new(client)
        .await
        .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

    Ok((
        DistributedMutex::new(conn.clone(), lock_ttl),
        PriorityQueue::new(conn.clone()),
        StatusRegistry::new(conn),
    ))
}
