//! `/v1/reservations*` handlers (immediate path, C5).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use ticketing_core::{EventId, Reservation, ReservationId, SeatId};
use ticketing_web::{AppError, AuthenticatedUser};

use crate::engine::ImmediateEngine;
use crate::handlers::check_user_matches;

/// Body of `POST /v1/reservations`.
#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    /// Event the seats belong to.
    pub event_id: i64,
    /// Seats to place a hold on.
    pub seat_ids: Vec<i64>,
    /// Optional client session identifier.
    pub session_id: Option<String>,
    /// Optional user id echoed by the client; must match `X-User-ID` (§6.1).
    pub user_id: Option<String>,
}

/// Response body of `POST /v1/reservations`.
#[derive(Debug, Serialize)]
pub struct ReserveResponse {
    /// One reservation per seat, sharing a common `expires_at`.
    pub reservations: Vec<Reservation>,
    /// Sum of the held seats' prices, in cents.
    pub total_cents: u64,
}

/// `POST /v1/reservations` - place a hold on one or more seats.
///
/// # Errors
///
/// See §7's error table: 400 on malformed input, 403 on user mismatch, 409
/// on conflict/unavailable seats.
pub async fn create_reservation(
    State(engine): State<Arc<ImmediateEngine>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<ReserveResponse>), AppError> {
    check_user_matches(&user, body.user_id.as_deref())?;

    let seat_ids: Vec<SeatId> = body.seat_ids.iter().map(|&id| SeatId::from_raw(id)).collect();
    let (reservations, total) = engine
        .reserve(EventId::from_raw(body.event_id), &seat_ids, &user, body.session_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReserveResponse {
            reservations,
            total_cents: total.cents(),
        }),
    ))
}

/// `GET /v1/reservations/{id}` - read a reservation.
///
/// # Errors
///
/// Returns 404 if the reservation does not exist, 403 if not owned by the
/// caller.
pub async fn get_reservation(
    State(engine): State<Arc<ImmediateEngine>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = engine.get_reservation(ReservationId::from_raw(id)).await?;
    if reservation.user_id != user {
        return Err(AppError::forbidden("reservation is not owned by the caller"));
    }
    Ok(Json(reservation))
}

/// `DELETE /v1/reservations/{id}` - cancel a reservation.
///
/// # Errors
///
/// Returns 404 if missing, 403 if not owned by the caller.
pub async fn cancel_reservation(
    State(engine): State<Arc<ImmediateEngine>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = engine
        .cancel_reservation(ReservationId::from_raw(id), &user)
        .await?;
    Ok(Json(reservation))
}

/// Body of `POST /v1/reservations/{id}/extend`.
#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    /// Additional minutes to add to the hold deadline, bounded to `[1, 15]`.
    pub minutes: i64,
}

/// `POST /v1/reservations/{id}/extend` - extend a hold's deadline.
///
/// # Errors
///
/// Returns 400 if `minutes` is out of bounds, 403 if not owned by the
/// caller.
pub async fn extend_reservation(
    State(engine): State<Arc<ImmediateEngine>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ExtendRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = engine
        .extend_reservation(ReservationId::from_raw(id), &user, body.minutes)
        .await?;
    Ok(Json(reservation))
}

