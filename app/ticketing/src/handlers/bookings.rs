//! `/v1/bookings*` handlers (immediate path, C5).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use ticketing_core::{Booking, BookingId, EventId, SeatId};
use ticketing_web::{AppError, AuthenticatedUser};

use crate::engine::ImmediateEngine;
use crate::handlers::check_user_matches;

/// Body of `POST /v1/bookings`.
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    /// Event the seats belong to.
    pub event_id: i64,
    /// Seats currently held by the caller, to convert into a booking.
    pub seat_ids: Vec<i64>,
    /// Optional user id echoed by the client; must match `X-User-ID` (§6.1).
    pub user_id: Option<String>,
}

/// `POST /v1/bookings` - convert held seats into a pending booking.
///
/// # Errors
///
/// Returns 409 on conflict/unavailable seats, 403 on user mismatch or if
/// the seats are held by a different user.
pub async fn create_booking(
    State(engine): State<Arc<ImmediateEngine>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(body): Json<BookRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    check_user_matches(&user, body.user_id.as_deref())?;

    let seat_ids: Vec<SeatId> = body.seat_ids.iter().map(|&id| SeatId::from_raw(id)).collect();
    let booking = engine
        .book(EventId::from_raw(body.event_id), &seat_ids, &user)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Body of `POST /v1/bookings/{id}/confirm-payment`.
///
/// The spec exposes a single finalize endpoint covering both payment
/// outcomes (§4.3.3 models `confirm_payment`/`fail_payment` as two engine
/// primitives, but §6.1's operation surface only names one HTTP route) -
/// `success` selects which primitive runs.
#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    /// Payment gateway identifier for this transaction.
    pub payment_id: String,
    /// Whether the gateway reported success. Defaults to `true`.
    #[serde(default = "default_true")]
    pub success: bool,
}

const fn default_true() -> bool {
    true
}

/// `POST /v1/bookings/{id}/confirm-payment` - finalize a pending booking.
///
/// # Errors
///
/// Returns 400 if the booking is not `PENDING`, 403 if not owned by the
/// caller.
pub async fn confirm_payment(
    State(engine): State<Arc<ImmediateEngine>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ConfirmPaymentRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking_id = BookingId::from_raw(id);
    let booking = if body.success {
        engine.confirm_payment(booking_id, &user, &body.payment_id).await?
    } else {
        engine.fail_payment(booking_id, &user, &body.payment_id).await?
    };
    Ok(Json(booking))
}

/// `POST /v1/bookings/{id}/cancel` - cancel a booking and release its seats.
///
/// # Errors
///
/// Returns 400 if the booking is already terminal, 403 if not owned by the
/// caller.
pub async fn cancel_booking(
    State(engine): State<Arc<ImmediateEngine>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let booking = engine.cancel_booking(BookingId::from_raw(id), &user).await?;
    Ok(Json(booking))
}
