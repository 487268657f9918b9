//! Distributed mutex over the coordination store (C3, §4.1).
//!
//! A lease lock is a Redis key `lock:<key>` whose value is an owner token
//! generated fresh on every acquisition. `release` and `extend` are
//! compare-and-delete / compare-and-(re)expire against that token: an
//! unconditional `DEL` is forbidden because an expired lease may already
//! belong to a different owner by the time the original caller gets around
//! to releasing it.
//!
//! `multi_lock` is the only supported way to acquire more than one key: it
//! sorts the keys into byte order first, which is the sole deadlock
//! avoidance mechanism described in §4.1 - every caller that needs more than
//! one key must go through it rather than calling `acquire` in a loop.

use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::error::{CoordinationError, Result};

const RELEASE_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
else
    return 0
end
";

const EXTEND_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('PEXPIRE', KEYS[1], ARGV[2])
else
    return 0
end
";

/// An owning handle to one or more acquired locks.
///
/// Dropping this guard without calling [`LockGuard::release`] leaks the
/// lease until its TTL expires naturally - it does not release locks on
/// drop, since release is fallible (it talks to Redis) and the caller must
/// be able to observe and react to a `NotOwner` result (§4.1: "the caller
/// must report the operation as potentially-divergent"). Callers therefore
/// call `release` explicitly from every exit path of their critical
/// section, exactly like the context-managed locks described in §9.
pub struct LockGuard {
    keys: Vec<String>,
    owner: String,
}

impl LockGuard {
    /// The owner token stamped on every key this guard holds.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The keys (already lock-prefixed) held by this guard, in acquisition
    /// order.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// Distributed mutex backed by the coordination store.
#[derive(Clone)]
pub struct DistributedMutex {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl DistributedMutex {
    /// Wraps a Redis connection manager. `default_ttl` is the lease TTL used
    /// when a caller does not specify one explicitly (default 30s per §6.4).
    #[must_use]
    pub const fn new(conn: ConnectionManager, default_ttl: Duration) -> Self {
        Self { conn, default_ttl }
    }

    fn redis_key(key: &str) -> String {
        format!("lock:{key}")
    }

    /// Attempts to acquire a single key once, non-blocking.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::Unavailable`] if the store cannot be
    /// reached. Returns `Ok(None)` (not an error) if the key is already
    /// held.
    pub async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<LockGuard>> {
        let owner = Uuid::new_v4().to_string();
        let redis_key = Self::redis_key(key);
        let mut conn = self.conn.clone();

        #[allow(clippy::cast_possible_truncation)]
        let ttl_ms = ttl.as_millis() as u64;

        let acquired: bool = redis::cmd("SET")
            .arg(&redis_key)
            .arg(&owner)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map(|reply| reply.is_some())
            .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

        if acquired {
            Ok(Some(LockGuard {
                keys: vec![redis_key],
                owner,
            }))
        } else {
            Ok(None)
        }
    }

    /// Acquires a single key, retrying up to `max_retries` times with a
    /// fixed `retry_delay` between attempts when `blocking` is set.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::RetriesExhausted`] if the key is still
    /// held after the retry budget is spent.
    pub async fn acquire(
        &self,
        key: &str,
        ttl: Duration,
        blocking: bool,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<LockGuard> {
        if let Some(guard) = self.try_acquire(key, ttl).await? {
            return Ok(guard);
        }
        if !blocking {
            return Err(CoordinationError::RetriesExhausted);
        }

        for _ in 0..max_retries {
            tokio::time::sleep(retry_delay).await;
            if let Some(guard) = self.try_acquire(key, ttl).await? {
                return Ok(guard);
            }
        }

        Err(CoordinationError::RetriesExhausted)
    }

    /// Acquires a set of keys in sorted byte order, the sole deadlock
    /// avoidance mechanism in this system (§4.1). On any partial failure,
    /// every key already acquired is released in reverse order before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::RetriesExhausted`] if any key in the set
    /// could not be acquired within its retry budget.
    pub async fn multi_lock(
        &self,
        keys: impl IntoIterator<Item = String>,
        ttl: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<LockGuard> {
        let mut sorted: Vec<String> = keys.into_iter().collect();
        sorted.sort();

        let owner = Uuid::new_v4().to_string();
        let mut acquired_redis_keys: Vec<String> = Vec::with_capacity(sorted.len());

        for key in &sorted {
            match self
                .acquire_with_owner(key, &owner, ttl, max_retries, retry_delay)
                .await
            {
                Ok(redis_key) => acquired_redis_keys.push(redis_key),
                Err(err) => {
                    self.release_keys(&acquired_redis_keys, &owner).await;
                    return Err(err);
                }
            }
        }

        Ok(LockGuard {
            keys: acquired_redis_keys,
            owner,
        })
    }

    async fn acquire_with_owner(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<String> {
        let redis_key = Self::redis_key(key);
        #[allow(clippy::cast_possible_truncation)]
        let ttl_ms = ttl.as_millis() as u64;

        for attempt in 0..=max_retries {
            let mut conn = self.conn.clone();
            let acquired: Option<String> = redis::cmd("SET")
                .arg(&redis_key)
                .arg(owner)
                .arg("NX")
                .arg("PX")
                .arg(ttl_ms)
                .query_async(&mut conn)
                .await
                .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

            if acquired.is_some() {
                return Ok(redis_key);
            }
            if attempt < max_retries {
                tokio::time::sleep(retry_delay).await;
            }
        }

        Err(CoordinationError::RetriesExhausted)
    }

    async fn release_keys(&self, redis_keys: &[String], owner: &str) {
        for redis_key in redis_keys.iter().rev() {
            let mut conn = self.conn.clone();
            let script = redis::Script::new(RELEASE_SCRIPT);
            let result: redis::RedisResult<i64> = script
                .key(redis_key)
                .arg(owner)
                .invoke_async(&mut conn)
                .await;
            if let Err(err) = result {
                tracing::warn!(key = %redis_key, error = %err, "failed to release lock during rollback");
            }
        }
    }

    /// Releases every key held by `guard` via compare-and-delete against its
    /// owner token, in reverse acquisition order.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::NotOwner`] naming the first key whose
    /// lease had already been reclaimed by another owner (lost ownership
    /// due to TTL expiry, per §4.1). Other keys are still released before
    /// the error is returned.
    pub async fn release(&self, guard: &LockGuard) -> Result<()> {
        let script = redis::Script::new(RELEASE_SCRIPT);
        let mut lost_ownership: Option<String> = None;

        for redis_key in guard.keys.iter().rev() {
            let mut conn = self.conn.clone();
            let deleted: i64 = script
                .key(redis_key)
                .arg(&guard.owner)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

            if deleted == 0 && lost_ownership.is_none() {
                lost_ownership = Some(redis_key.clone());
            }
        }

        match lost_ownership {
            Some(key) => Err(CoordinationError::NotOwner { key }),
            None => Ok(()),
        }
    }

    /// Extends the TTL of every key held by `guard`, compare-and-(re)expire
    /// against its owner token.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinationError::NotOwner`] if any key's lease is no
    /// longer owned by this guard.
    pub async fn extend(&self, guard: &LockGuard, ttl: Duration) -> Result<()> {
        let script = redis::Script::new(EXTEND_SCRIPT);
        #[allow(clippy::cast_possible_truncation)]
        let ttl_ms = ttl.as_millis() as u64;

        for redis_key in &guard.keys {
            let mut conn = self.conn.clone();
            let extended: i64 = script
                .key(redis_key)
                .arg(&guard.owner)
                .arg(ttl_ms)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| CoordinationError::Unavailable(e.to_string()))?;

            if extended == 0 {
                return Err(CoordinationError::NotOwner {
                    key: redis_key.clone(),
                });
            }
        }

        Ok(())
    }

    /// Default lease TTL configured for this mutex.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_key_is_prefixed() {
        assert_eq!(DistributedMutex::redis_key("seat:10"), "lock:seat:10");
    }
}
