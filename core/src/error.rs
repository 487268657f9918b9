//! Error kinds raised by the seat lifecycle engine and its two concurrency paths.
//!
//! These are transport-agnostic: the web layer maps each variant to an HTTP
//! status, the v2 queue worker writes the message into the status registry
//! instead of returning it to a caller directly.

use thiserror::Error;

/// Error kinds exposed by the core engine.
///
/// Every variant here corresponds to a row in the error-handling table: it
/// names the situation, not the transport it will eventually be surfaced as.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Seat count out of bounds, malformed id, or unknown status filter.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown event/seat/reservation/booking id.
    #[error("not found: {0}")]
    NotFound(String),

    /// A seat does not belong to the claimed event.
    #[error("wrong event: {0}")]
    WrongEvent(String),

    /// One or more seats are not in the expected prior state.
    ///
    /// Carries the offending seat labels so the caller can surface which
    /// seats lost the race.
    #[error("seats not available: {}", .labels.join(", "))]
    Unavailable {
        /// Human-readable seat labels that failed the availability check.
        labels: Vec<String>,
    },

    /// The principal is not the owning user of the resource.
    #[error("forbidden")]
    Forbidden,

    /// The distributed mutex exhausted its retry budget.
    #[error("lock contended, retry")]
    RetryableConflict,

    /// A booking or reservation is not in the status required for the
    /// requested transition.
    #[error("state mismatch: {0}")]
    StateMismatch(String),

    /// The coordination store is unreachable.
    #[error("coordination store unavailable: {0}")]
    InfraUnavailable(String),
}

impl CoreError {
    /// Builds an [`CoreError::Unavailable`] from seat labels that lost the race.
    #[must_use]
    pub fn unavailable<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Unavailable {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// A short machine-readable tag for this error kind, used in the status
    /// registry and in API error bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::WrongEvent(_) => "WRONG_EVENT",
            Self::Unavailable { .. } => "UNAVAILABLE",
            Self::Forbidden => "FORBIDDEN",
            Self::RetryableConflict => "RETRYABLE_CONFLICT",
            Self::StateMismatch(_) => "STATE_MISMATCH",
            Self::InfraUnavailable(_) => "INFRA_UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_joins_labels_in_message() {
        let err = CoreError::unavailable(["10", "11"]);
        assert_eq!(err.to_string(), "seats not available: 10, 11");
        assert_eq!(err.code(), "UNAVAILABLE");
    }

    #[test]
    fn code_matches_table() {
        assert_eq!(CoreError::InvalidInput(String::new()).code(), "INVALID_INPUT");
        assert_eq!(CoreError::Forbidden.code(), "FORBIDDEN");
        assert_eq!(CoreError::RetryableConflict.code(), "RETRYABLE_CONFLICT");
    }
}
