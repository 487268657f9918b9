//! `/ready` readiness handler.
//!
//! Unlike `ticketing_web::handlers::health_check` (a pure liveness probe),
//! this checks that both backing stores are actually reachable - a pod that
//! answers `/health` but fails `/ready` should be taken out of a load
//! balancer's rotation without being restarted.

use axum::extract::State;
use axum::http::StatusCode;

use ticketing_core::EventId;
use ticketing_coordination::Priority;

use crate::state::AppState;

/// `GET /ready` - checks `PostgreSQL` and the coordination store.
///
/// A nonexistent event id / priority stream is probed deliberately: a
/// `NOT_FOUND`/empty result still proves the round-trip succeeded, which is
/// all readiness needs to know.
#[allow(clippy::unused_async)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let postgres_ok = matches!(
        state.immediate.get_event(EventId::from_raw(0)).await,
        Ok(_) | Err(ticketing_core::CoreError::NotFound(_))
    );

    let redis_ok = state
        .queue
        .stats(EventId::from_raw(0), Priority::High)
        .await
        .is_ok();

    if postgres_ok && redis_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
