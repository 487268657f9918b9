//! Core types shared across the ticketing engine.
//!
//! This crate holds the identifiers, error kinds, money value object and the
//! `Clock` abstraction used by every other crate in the workspace. It has no
//! dependency on Postgres, Redis or the web layer: it is the vocabulary the
//! rest of the system is written in.

pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod clock;
pub mod domain;
pub mod error;
pub mod ids;
pub mod money;

pub use clock::{Clock, SystemClock};
pub use domain::{
    Booking, BookingSeat, BookingStatus, Event, EventStatus, PaymentStatus, Reservation,
    ReservationStatus, Seat, SeatStatus, SeatType,
};
pub use error::CoreError;
pub use ids::{BookingId, BookingReference, EventId, ReservationId, RequestId, SeatId, UserId};
pub use money::Money;
