//! Row types mapping 1:1 onto the tables in `migrations/0001_init.sql`,
//! plus conversions into the domain types from `ticketing-core`.

use chrono::{DateTime, Utc};
use ticketing_core::{
    Booking, BookingId, BookingReference, BookingSeat, BookingStatus, Event, EventId, EventStatus,
    Money, PaymentStatus, Reservation, ReservationId, ReservationStatus, Seat, SeatId,
    SeatStatus, SeatType, UserId,
};

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    pub id: i64,
    pub name: String,
    pub event_time: DateTime<Utc>,
    pub venue: String,
    pub total_seats: i64,
    pub available_seats: i64,
    pub status: String,
    pub sale_starts_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_raw(row.id),
            name: row.name,
            event_time: row.event_time,
            venue: row.venue,
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            status: parse_event_status(&row.status),
            sale_starts_at: row.sale_starts_at,
            created_at: row.created_at,
        }
    }
}

pub(crate) fn parse_event_status(s: &str) -> EventStatus {
    match s {
        "ON_SALE" => EventStatus::OnSale,
        "SOLD_OUT" => EventStatus::SoldOut,
        "CANCELLED" => EventStatus::Cancelled,
        _ => EventStatus::Upcoming,
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeatRow {
    pub id: i64,
    pub event_id: i64,
    pub seat_number: String,
    pub section: Option<String>,
    pub row_label: Option<String>,
    pub seat_type: String,
    pub price_cents: i64,
    pub status: String,
    pub version: i64,
    pub holder_user_id: Option<String>,
    pub reserved_until: Option<DateTime<Utc>>,
    pub booking_id: Option<i64>,
}

impl From<SeatRow> for Seat {
    fn from(row: SeatRow) -> Self {
        Self {
            id: SeatId::from_raw(row.id),
            event_id: EventId::from_raw(row.event_id),
            seat_number: row.seat_number,
            section: row.section,
            row: row.row_label,
            seat_type: parse_seat_type(&row.seat_type),
            price: Money::from_cents(u64::try_from(row.price_cents).unwrap_or(0)),
            status: parse_seat_status(&row.status),
            version: row.version,
            holder: row.holder_user_id.map(UserId::from),
            reserved_until: row.reserved_until,
            booking_id: row.booking_id.map(BookingId::from_raw),
        }
    }
}

pub(crate) fn parse_seat_type(s: &str) -> SeatType {
    match s {
        "VIP" => SeatType::Vip,
        "PREMIUM" => SeatType::Premium,
        _ => SeatType::Regular,
    }
}

pub(crate) fn parse_seat_status(s: &str) -> SeatStatus {
    match s {
        "RESERVED" => SeatStatus::Reserved,
        "BOOKED" => SeatStatus::Booked,
        "BLOCKED" => SeatStatus::Blocked,
        _ => SeatStatus::Available,
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReservationRow {
    pub id: i64,
    pub seat_id: i64,
    pub event_id: i64,
    pub user_id: String,
    pub session_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Self {
            id: ReservationId::from_raw(row.id),
            seat_id: SeatId::from_raw(row.seat_id),
            event_id: EventId::from_raw(row.event_id),
            user_id: UserId::from(row.user_id),
            session_id: row.session_id,
            expires_at: row.expires_at,
            status: parse_reservation_status(&row.status),
            created_at: row.created_at,
        }
    }
}

pub(crate) fn parse_reservation_status(s: &str) -> ReservationStatus {
    match s {
        "CONFIRMED" => ReservationStatus::Confirmed,
        "EXPIRED" => ReservationStatus::Expired,
        "CANCELLED" => ReservationStatus::Cancelled,
        _ => ReservationStatus::Active,
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: i64,
    pub event_id: i64,
    pub user_id: String,
    pub total_amount_cents: i64,
    pub status: String,
    pub payment_status: String,
    pub payment_id: Option<String>,
    pub booking_reference: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: BookingId::from_raw(row.id),
            event_id: EventId::from_raw(row.event_id),
            user_id: UserId::from(row.user_id),
            total_amount: Money::from_cents(u64::try_from(row.total_amount_cents).unwrap_or(0)),
            status: parse_booking_status(&row.status),
            payment_status: parse_payment_status(&row.payment_status),
            payment_id: row.payment_id,
            reference: BookingReference::parse(&row.booking_reference)
                .unwrap_or_else(|_| BookingReference::new()),
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
        }
    }
}

pub(crate) fn parse_booking_status(s: &str) -> BookingStatus {
    match s {
        "CONFIRMED" => BookingStatus::Confirmed,
        "CANCELLED" => BookingStatus::Cancelled,
        "FAILED" => BookingStatus::Failed,
        _ => BookingStatus::Pending,
    }
}

pub(crate) fn parse_payment_status(s: &str) -> PaymentStatus {
    match s {
        "SUCCESS" => PaymentStatus::Success,
        "FAILED" => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingSeatRow {
    pub booking_id: i64,
    pub seat_id: i64,
    pub price_cents: i64,
}

impl From<BookingSeatRow> for BookingSeat {
    fn from(row: BookingSeatRow) -> Self {
        Self {
            booking_id: BookingId::from_raw(row.booking_id),
            seat_id: SeatId::from_raw(row.seat_id),
            price: Money::from_cents(u64::try_from(row.price_cents).unwrap_or(0)),
        }
    }
}
