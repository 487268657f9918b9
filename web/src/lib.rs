//! Generic Axum plumbing shared by the ticketing HTTP facade.
//!
//! This crate is deliberately domain-agnostic: it knows nothing about
//! events, seats, reservations or bookings. It only provides the pieces an
//! Axum service needs regardless of what it serves — a uniform error type
//! that maps domain errors to HTTP status codes, request extractors
//! (correlation id, client ip, user agent), and the correlation-id
//! middleware layer. The ticketing-specific `AppState`, handlers and routes
//! live in the application crate, which depends on this one (never the
//! other way around).
//!
//! # Example
//!
//! ```ignore
//! use ticketing_web::AppError;
//! use axum::{Router, routing::get, Json};
//!
//! async fn handler() -> Result<Json<&'static str>, AppError> {
//!     Ok(Json("ok"))
//! }
//!
//! let app: Router<()> = Router::new().route("/ping", get(handler));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{AuthenticatedUser, ClaimedPriority, ClientIp, CorrelationId, UserAgent};
pub use middleware::{correlation_id_layer, CorrelationIdExt, CORRELATION_ID_HEADER};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
