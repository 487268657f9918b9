//! `PostgreSQL`-backed durable store (C1) and seat lifecycle engine (C4).
//!
//! [`PgStore`] is the system of record for events, seats, reservations and
//! bookings (§6.2): every mutation it exposes runs inside a single
//! transaction with `SELECT ... FOR UPDATE` row locks ordered by primary
//! key, the sole deadlock-avoidance discipline this layer relies on (§4.2).
//! Callers on the immediate path (`ticketing-app`'s v1 facade) additionally
//! wrap these calls with the distributed mutex from `ticketing-coordination`;
//! callers on the queued path rely on the stream's single-consumer-per-event
//! guarantee instead (§4.4, §4.5).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod models;
mod repository;

pub use repository::PgStore;
