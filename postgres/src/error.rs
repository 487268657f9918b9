//! Maps low-level `sqlx` failures onto the transport-agnostic [`CoreError`].

use ticketing_core::CoreError;

/// Converts an infrastructure-level database error into the engine's
/// `INFRA_UNAVAILABLE` kind. Business-rule failures (not found, wrong event,
/// unavailable, forbidden, state mismatch) are raised directly by the
/// repository methods and never pass through this path.
pub(crate) fn infra(err: sqlx::Error) -> CoreError {
    CoreError::InfraUnavailable(err.to_string())
}
