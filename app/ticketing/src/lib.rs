//! Seat lifecycle engine facade: the immediate (v1) and queued (v2)
//! concurrency paths, the reclaimer, and the HTTP surface built on top of
//! them.
//!
//! This crate owns everything domain-specific - `ticketing-web` only
//! supplies generic Axum plumbing (errors, extractors, middleware) with no
//! knowledge of events, seats, reservations or bookings.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod engine;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::build_router;
pub use state::AppState;
