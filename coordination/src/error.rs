//! Error type for the coordination store (C2/C3/C6/C7).

use thiserror::Error;

/// Result type alias for coordination operations.
pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Failure modes raised by the distributed mutex, priority streams and
/// status registry.
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// The Redis connection could not be established or a command failed
    /// to reach the server. Maps to `CoreError::InfraUnavailable` at the
    /// facade boundary.
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),

    /// A `release`/`extend` compare-and-delete found the lease owned by a
    /// different token than the caller's - the lease expired and was
    /// re-acquired by someone else (§4.1).
    #[error("lock `{key}` is no longer owned by this caller")]
    NotOwner {
        /// The lock key that was no longer owned.
        key: String,
    },

    /// `multi_lock` exhausted `max_retries * retry_delay` without acquiring
    /// every key in the set.
    #[error("lock acquisition exhausted its retry budget")]
    RetriesExhausted,

    /// A stored hash record failed to (de)serialize.
    #[error("malformed coordination record: {0}")]
    Malformed(String),

    /// A status transition would have regressed the monotonic lattice
    /// `PENDING -> PROCESSING -> {COMPLETED, FAILED}` (§4.6).
    #[error("status for `{request_id}` would regress from `{current}` to `{attempted}`")]
    StatusRegression {
        /// The request id whose status transition was rejected.
        request_id: String,
        /// The status already recorded.
        current: String,
        /// The status the caller attempted to write.
        attempted: String,
    },
}
