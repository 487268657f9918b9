//! Domain entities for the seat lifecycle engine (§3).
//!
//! These are plain data types with no I/O: they mirror the rows of the
//! relational schema (§6.2) closely enough that the postgres crate can map
//! `FromRow` output directly onto them, but they carry none of the
//! transaction, locking or version-check discipline that gives the
//! invariants in §3 their teeth - that lives in `ticketing-postgres`, which
//! is the only place these values are mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BookingId, BookingReference, EventId, ReservationId, SeatId, UserId};
use crate::money::Money;

/// Sale state of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Not yet on sale.
    Upcoming,
    /// Accepting reservations and bookings.
    OnSale,
    /// No seats remain available.
    SoldOut,
    /// The event was called off; no further sales are accepted.
    Cancelled,
}

impl EventStatus {
    /// Whether the engine accepts new `reserve` calls against an event in
    /// this state.
    #[must_use]
    pub const fn accepts_sales(self) -> bool {
        matches!(self, Self::OnSale)
    }
}

/// A seated event.
///
/// `available_seats` is a denormalized cache (§3): it is updated inside the
/// same transaction as every seat-status mutation, but the per-seat status
/// table remains authoritative. Callers that need a precise count should
/// scan seats rather than trust this field under heavy contention.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Surrogate identity.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Scheduled event time.
    pub event_time: DateTime<Utc>,
    /// Venue name or description.
    pub venue: String,
    /// Total number of seats configured for this event.
    pub total_seats: i64,
    /// Denormalized count of seats currently available.
    pub available_seats: i64,
    /// Current sale status.
    pub status: EventStatus,
    /// Optional scheduled sale-start time.
    pub sale_starts_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Seat category, used for pricing tiers and v2 priority promotion policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatType {
    /// Standard seating.
    Regular,
    /// Very important person seating.
    Vip,
    /// Premium seating, above VIP in price but not necessarily in priority.
    Premium,
}

/// Current occupancy state of a seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    /// Free to reserve.
    Available,
    /// Held by a user until `reserved_until`.
    Reserved,
    /// Attached to a booking.
    Booked,
    /// Administratively withheld from sale (never produced by the engine
    /// itself; reserved for CRUD administration, out of scope here per §1).
    Blocked,
}

/// A single seat belonging to an event.
///
/// `version` is the optimistic-concurrency token and linearizability witness
/// described in §3 invariant 4 and §8: it strictly increases across every
/// committed mutation of this row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    /// Surrogate identity.
    pub id: SeatId,
    /// Event this seat belongs to.
    pub event_id: EventId,
    /// Human-readable label, unique within the event (e.g. "A12").
    pub seat_number: String,
    /// Optional section.
    pub section: Option<String>,
    /// Optional row within the section.
    pub row: Option<String>,
    /// Pricing/priority category.
    pub seat_type: SeatType,
    /// Current price.
    pub price: Money,
    /// Current occupancy state.
    pub status: SeatStatus,
    /// Monotonic mutation counter.
    pub version: i64,
    /// User currently holding this seat, if `status = RESERVED`.
    pub holder: Option<UserId>,
    /// Hold expiry, if `status = RESERVED`.
    pub reserved_until: Option<DateTime<Utc>>,
    /// Booking this seat is attached to, if `status = BOOKED`.
    pub booking_id: Option<BookingId>,
}

impl Seat {
    /// Whether this seat can be claimed by a fresh `reserve` call.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.status, SeatStatus::Available)
    }
}

/// Lifecycle status of a single-seat reservation (§3).
///
/// `Active` is the only non-terminal status; `Confirmed`, `Expired` and
/// `Cancelled` are terminal and the transition into them is one-way (§8
/// status-lattice monotonicity).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Hold is live; the seat is RESERVED by this reservation's user.
    Active,
    /// The hold was consumed by a successful `book` call.
    Confirmed,
    /// The reclaimer expired this hold.
    Expired,
    /// The user (or an operator) cancelled this hold before it expired.
    Cancelled,
}

impl ReservationStatus {
    /// Whether this status is terminal (no further transitions are valid).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// A time-limited, exclusive claim on one seat.
///
/// Exactly one `Reservation` row is created per seat per `reserve` call
/// (§4.3.1); a multi-seat reservation produces N reservations sharing the
/// same `expires_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Surrogate identity.
    pub id: ReservationId,
    /// Seat this reservation claims.
    pub seat_id: SeatId,
    /// Event the seat belongs to (denormalized for query convenience).
    pub event_id: EventId,
    /// Holding user.
    pub user_id: UserId,
    /// Optional client session identifier.
    pub session_id: Option<String>,
    /// Hold expiry.
    pub expires_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: ReservationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Booking status (§3). `Pending` is the only non-terminal status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Created, awaiting payment confirmation.
    Pending,
    /// Payment succeeded; booking is final.
    Confirmed,
    /// The user or an operator cancelled the booking; seats were released.
    Cancelled,
    /// Payment failed; seats were released.
    Failed,
}

/// Payment status tracked alongside booking status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting a confirm or fail call from the payment gateway integration
    /// (out of scope here; see §1).
    Pending,
    /// The gateway reported success.
    Success,
    /// The gateway reported failure.
    Failed,
}

/// A confirmed (or pending) claim on a set of seats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Surrogate identity.
    pub id: BookingId,
    /// Event this booking belongs to.
    pub event_id: EventId,
    /// Owning user.
    pub user_id: UserId,
    /// Sum of constituent seat prices, snapshotted at booking time.
    pub total_amount: Money,
    /// Current booking status.
    pub status: BookingStatus,
    /// Current payment status.
    pub payment_status: PaymentStatus,
    /// External payment gateway identifier, once known.
    pub payment_id: Option<String>,
    /// Globally unique, time-sortable, opaque reference quoted to the user.
    pub reference: BookingReference,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp the booking was confirmed, if it has been.
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// A seat attached to a booking, with its price snapshotted at booking time.
///
/// Snapshotting the price here (rather than joining against the live `Seat`
/// row) is what makes historical bookings immune to later seat price changes
/// (§4.3.2).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingSeat {
    /// Owning booking.
    pub booking_id: BookingId,
    /// Seat claimed by this line item.
    pub seat_id: SeatId,
    /// Price at the moment of booking.
    pub price: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_on_sale_accepts_reservations() {
        assert!(EventStatus::OnSale.accepts_sales());
        assert!(!EventStatus::Upcoming.accepts_sales());
        assert!(!EventStatus::SoldOut.accepts_sales());
        assert!(!EventStatus::Cancelled.accepts_sales());
    }

    #[test]
    fn only_active_reservation_is_non_terminal() {
        assert!(!ReservationStatus::Active.is_terminal());
        assert!(ReservationStatus::Confirmed.is_terminal());
        assert!(ReservationStatus::Expired.is_terminal());
        assert!(ReservationStatus::Cancelled.is_terminal());
    }
}
