//! Liveness endpoint shared by every service built on this crate.
//!
//! Readiness (checking `PostgreSQL`/coordination-store connectivity) is
//! domain-specific and lives alongside the application's own `AppState`,
//! not here.

use axum::http::StatusCode;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the process is running. This endpoint does
/// NOT check dependencies (database, coordination store, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_check_reports_ok() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
