//! `/v2/*` handlers (queued path, C6/C9).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use ticketing_coordination::{Priority, RequestStatus, StatusRecord};
use ticketing_core::{EventId, RequestId};
use ticketing_web::{AppError, AuthenticatedUser, ClaimedPriority};

use crate::engine::queued::submit_reservation;
use crate::handlers::check_user_matches;
use crate::state::AppState;

/// Body of `POST /v2/reservations`.
#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    /// Event the seats belong to.
    pub event_id: i64,
    /// Seats to request a hold on.
    pub seat_ids: Vec<i64>,
    /// Optional client session identifier.
    pub session_id: Option<String>,
    /// Optional user id echoed by the client; must match `X-User-ID` (§6.1).
    pub user_id: Option<String>,
}

/// Response body of `POST /v2/reservations`.
#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    /// Handle the client polls via `GET /v2/reservations/{request_id}`.
    pub request_id: String,
}

/// `POST /v2/reservations` - enqueue a reservation request.
///
/// Always returns 202 with a `request_id`, even if the underlying primitive
/// will ultimately fail - failures surface through the status registry
/// instead (§7).
///
/// # Errors
///
/// Returns 403 if the request body names a different user than `X-User-ID`.
pub async fn enqueue_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    claimed_priority: ClaimedPriority,
    Json(body): Json<EnqueueRequest>,
) -> Result<(StatusCode, Json<EnqueueResponse>), AppError> {
    check_user_matches(&user, body.user_id.as_deref())?;

    let event_id = EventId::from_raw(body.event_id);
    let priority = if claimed_priority == ClaimedPriority::RequestedHigh
        && state.premium_catalog.is_premium(&user)
    {
        Priority::High
    } else {
        Priority::Normal
    };

    let request_id = submit_reservation(
        &state.queue,
        &state.status,
        event_id,
        user,
        body.seat_ids,
        priority,
        body.session_id,
    )
    .await?;

    state.workers.ensure_worker(event_id).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueResponse {
            request_id: request_id.to_string(),
        }),
    ))
}

/// Response body of `GET /v2/reservations/{request_id}`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Current lifecycle status.
    pub status: RequestStatus,
    /// Human-readable message, set once a terminal outcome is reached.
    pub message: Option<String>,
    /// Result payload, set once the request completes.
    pub result: Option<serde_json::Value>,
}

impl From<StatusRecord> for StatusResponse {
    fn from(record: StatusRecord) -> Self {
        Self {
            status: record.status,
            message: record.message,
            result: record.result,
        }
    }
}

/// `GET /v2/reservations/{request_id}` - poll a queued request's status.
///
/// # Errors
///
/// Returns 404 if `request_id` is not a valid identifier or has no record
/// (expired past its 24h TTL, or never existed).
pub async fn poll_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let request_id = RequestId::parse(&request_id)
        .map_err(|_| AppError::not_found("request", &request_id))?;

    let record = state
        .status
        .get(request_id)
        .await?
        .ok_or_else(|| AppError::not_found("request", request_id.to_string()))?;

    Ok(Json(record.into()))
}

/// Response body of `GET /v2/queue/stats/{event_id}`.
#[derive(Debug, Serialize)]
pub struct QueueStatsResponse {
    /// Length and pending count of the HIGH priority stream.
    pub high: ticketing_coordination::QueueStats,
    /// Length and pending count of the NORMAL priority stream.
    pub normal: ticketing_coordination::QueueStats,
    /// Length and pending count of the LOW priority stream.
    pub low: ticketing_coordination::QueueStats,
}

/// `GET /v2/queue/stats/{event_id}` - per-priority stream length and
/// pending count.
///
/// # Errors
///
/// Returns 503 if the coordination store cannot be reached.
pub async fn queue_stats(
    State(state): State<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<QueueStatsResponse>, AppError> {
    let event_id = EventId::from_raw(event_id);

    let high = state.queue.stats(event_id, Priority::High).await?;
    let normal = state.queue.stats(event_id, Priority::Normal).await?;
    let low = state.queue.stats(event_id, Priority::Low).await?;

    Ok(Json(QueueStatsResponse { high, normal, low }))
}
