//! HTTP route table (§6.1).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{bookings, health, queue, reservations};
use crate::state::AppState;

/// Builds the full router: the versioned API surface plus liveness and
/// readiness probes.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route(
            "/reservations",
            post(reservations::create_reservation),
        )
        .route(
            "/reservations/:id",
            get(reservations::get_reservation).delete(reservations::cancel_reservation),
        )
        .route(
            "/reservations/:id/extend",
            post(reservations::extend_reservation),
        )
        .route("/bookings", post(bookings::create_booking))
        .route(
            "/bookings/:id/confirm-payment",
            post(bookings::confirm_payment),
        )
        .route("/bookings/:id/cancel", post(bookings::cancel_booking));

    let v2 = Router::new()
        .route("/reservations", post(queue::enqueue_reservation))
        .route("/reservations/:request_id", get(queue::poll_status))
        .route("/queue/stats/:event_id", get(queue::queue_stats));

    Router::new()
        .nest("/v1", v1)
        .nest("/v2", v2)
        .route("/health", get(ticketing_web::handlers::health_check))
        .route("/ready", get(health::readiness))
        .with_state(state)
}

