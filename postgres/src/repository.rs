//! Transactional seat lifecycle primitives (C4, §4.3) and the reclaimer
//! query (C8, §4.7), each executed as a single `sqlx::Transaction` against
//! the durable store (C1, §4.2).
//!
//! Every primitive follows the same shape: load the implicated rows with
//! `ORDER BY id FOR UPDATE` (the ordering is load-bearing — it is what
//! prevents transaction-level deadlock between two overlapping batches,
//! mirroring the sorted-key rule the distributed mutex uses at the
//! coordination-store layer), validate preconditions against the loaded
//! state, mutate, and commit. A precondition failure returns a business
//! [`CoreError`] without touching the transaction; only rollback on error is
//! implicit via `Transaction::drop`.

use std::time::Duration;

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use ticketing_core::{
    Booking, BookingId, BookingReference, BookingStatus, CoreError, Event, EventId, Money,
    Reservation, ReservationId, ReservationStatus, Seat, SeatId, SeatStatus, UserId,
};

use crate::error::infra;
use crate::models::{
    parse_booking_status, parse_event_status, parse_reservation_status, parse_seat_status,
    BookingRow, BookingSeatRow, EventRow, ReservationRow, SeatRow,
};

type CoreResult<T> = Result<T, CoreError>;

/// `PostgreSQL`-backed durable store (C1) and seat lifecycle engine (C4).
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and runs the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InfraUnavailable`] if the pool cannot be
    /// established or a migration fails to apply.
    pub async fn connect(database_url: &str) -> CoreResult<Self> {
        let pool = PgPool::connect(database_url).await.map_err(infra)?;
        let store = Self::new(pool);
        store.run_migrations().await?;
        Ok(store)
    }

    /// Runs the embedded migrations against the connected database.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InfraUnavailable`] if a migration fails.
    pub async fn run_migrations(&self) -> CoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CoreError::InfraUnavailable(e.to_string()))
    }

    /// Access to the underlying pool, for health checks.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---- reads ----------------------------------------------------------

    /// Loads an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such event exists.
    pub async fn get_event(&self, event_id: EventId) -> CoreResult<Event> {
        sqlx::query_as::<_, EventRow>(
            "SELECT id, name, event_time, venue, total_seats, available_seats,
                    status::TEXT AS status, sale_starts_at, created_at
             FROM events WHERE id = $1",
        )
        .bind(event_id.as_raw())
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?
        .map(Into::into)
        .ok_or_else(|| CoreError::NotFound(format!("event {event_id}")))
    }

    /// Loads a seat by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such seat exists.
    pub async fn get_seat(&self, seat_id: SeatId) -> CoreResult<Seat> {
        sqlx::query_as::<_, SeatRow>(
            "SELECT id, event_id, seat_number, section, row_label, seat_type::TEXT AS seat_type,
                    price_cents, status::TEXT AS status, version, holder_user_id,
                    reserved_until, booking_id
             FROM seats WHERE id = $1",
        )
        .bind(seat_id.as_raw())
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?
        .map(Into::into)
        .ok_or_else(|| CoreError::NotFound(format!("seat {seat_id}")))
    }

    /// Loads a reservation by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such reservation exists.
    pub async fn get_reservation(&self, id: ReservationId) -> CoreResult<Reservation> {
        sqlx::query_as::<_, ReservationRow>(
            "SELECT id, seat_id, event_id, user_id, session_id, expires_at,
                    status::TEXT AS status, created_at
             FROM reservations WHERE id = $1",
        )
        .bind(id.as_raw())
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?
        .map(Into::into)
        .ok_or_else(|| CoreError::NotFound(format!("reservation {id}")))
    }

    /// Loads a booking by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no such booking exists.
    pub async fn get_booking(&self, id: BookingId) -> CoreResult<Booking> {
        sqlx::query_as::<_, BookingRow>(
            "SELECT id, event_id, user_id, total_amount_cents, status::TEXT AS status,
                    payment_status::TEXT AS payment_status, payment_id,
                    booking_reference, created_at, confirmed_at
             FROM bookings WHERE id = $1",
        )
        .bind(id.as_raw())
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?
        .map(Into::into)
        .ok_or_else(|| CoreError::NotFound(format!("booking {id}")))
    }

    // ---- C4.1 reserve -----------------------------------------------------

    /// Claims a set of seats for `user`, per §4.3.1.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidInput`] if `seat_ids` is empty or exceeds `max_seats`.
    /// - [`CoreError::NotFound`] if the event, or any seat id, does not exist.
    /// - [`CoreError::WrongEvent`] if a seat belongs to a different event.
    /// - [`CoreError::StateMismatch`] if the event does not currently accept sales.
    /// - [`CoreError::Unavailable`] if any seat is not `AVAILABLE`.
    pub async fn reserve(
        &self,
        event_id: EventId,
        seat_ids: &[SeatId],
        user: &UserId,
        session_id: Option<String>,
        hold_timeout: Duration,
        max_seats: usize,
    ) -> CoreResult<(Vec<Reservation>, Money)> {
        if seat_ids.is_empty() || seat_ids.len() > max_seats {
            return Err(CoreError::InvalidInput(format!(
                "seat_ids length {} must be between 1 and {max_seats}",
                seat_ids.len()
            )));
        }

        let mut tx = self.pool.begin().await.map_err(infra)?;

        let event = lock_event(&mut tx, event_id).await?;
        if !parse_event_status(&event.status).accepts_sales() {
            return Err(CoreError::StateMismatch(format!(
                "event {event_id} is not on sale"
            )));
        }

        let seats = lock_seats(&mut tx, seat_ids).await?;
        check_seats_belong_to_event(&seats, event_id)?;
        check_seats_available(&seats)?;

        let expires_at = Utc::now() + hold_timeout;
        let mut reservations = Vec::with_capacity(seats.len());
        let mut total_cents: i64 = 0;

        for seat in &seats {
            sqlx::query(
                "UPDATE seats
                 SET status = 'RESERVED', holder_user_id = $2, reserved_until = $3,
                     version = version + 1
                 WHERE id = $1",
            )
            .bind(seat.id)
            .bind(user.as_str())
            .bind(expires_at)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

            let row: ReservationRow = sqlx::query_as(
                "INSERT INTO reservations (seat_id, event_id, user_id, session_id, expires_at, status)
                 VALUES ($1, $2, $3, $4, $5, 'ACTIVE')
                 RETURNING id, seat_id, event_id, user_id, session_id, expires_at,
                           status::TEXT AS status, created_at",
            )
            .bind(seat.id)
            .bind(event_id.as_raw())
            .bind(user.as_str())
            .bind(session_id.as_deref())
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(infra)?;

            total_cents += seat.price_cents;
            reservations.push(row.into());
        }

        #[allow(clippy::cast_possible_wrap)]
        let claimed = seats.len() as i64;
        sqlx::query("UPDATE events SET available_seats = available_seats - $2 WHERE id = $1")
            .bind(event_id.as_raw())
            .bind(claimed)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

        tx.commit().await.map_err(infra)?;

        metrics::counter!("ticketing_reservations_total", "outcome" => "created")
            .increment(reservations.len() as u64);

        let total = Money::from_cents(u64::try_from(total_cents).unwrap_or_default());
        Ok((reservations, total))
    }

    // ---- C4.2 book ---------------------------------------------------------

    /// Converts an active hold into a pending booking, per §4.3.2.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if any seat id does not exist.
    /// - [`CoreError::WrongEvent`] if a seat belongs to a different event.
    /// - [`CoreError::Unavailable`] if a seat is not currently `RESERVED`.
    /// - [`CoreError::Forbidden`] if a seat is held by a different user.
    pub async fn book(
        &self,
        event_id: EventId,
        seat_ids: &[SeatId],
        user: &UserId,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        let seats = lock_seats(&mut tx, seat_ids).await?;
        check_seats_belong_to_event(&seats, event_id)?;

        let not_reserved: Vec<String> = seats
            .iter()
            .filter(|s| parse_seat_status(&s.status) != SeatStatus::Reserved)
            .map(|s| s.seat_number.clone())
            .collect();
        if !not_reserved.is_empty() {
            return Err(CoreError::unavailable(not_reserved));
        }
        if seats.iter().any(|s| s.holder_user_id.as_deref() != Some(user.as_str())) {
            return Err(CoreError::Forbidden);
        }

        let total = Money::checked_sum(seats.iter().map(|s| {
            Money::from_cents(u64::try_from(s.price_cents).unwrap_or_default())
        }))
        .ok_or_else(|| CoreError::InvalidInput("booking total overflowed".to_string()))?;

        let reference = BookingReference::new();
        let booking_row: BookingRow = sqlx::query_as(
            "INSERT INTO bookings (event_id, user_id, total_amount_cents, status, payment_status, booking_reference)
             VALUES ($1, $2, $3, 'PENDING', 'PENDING', $4)
             RETURNING id, event_id, user_id, total_amount_cents, status::TEXT AS status,
                       payment_status::TEXT AS payment_status, payment_id,
                       booking_reference, created_at, confirmed_at",
        )
        .bind(event_id.as_raw())
        .bind(user.as_str())
        .bind(i64::try_from(total.cents()).unwrap_or(i64::MAX))
        .bind(reference.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;

        for seat in &seats {
            sqlx::query(
                "INSERT INTO booking_seats (booking_id, seat_id, price_cents)
                 VALUES ($1, $2, $3)",
            )
            .bind(booking_row.id)
            .bind(seat.id)
            .bind(seat.price_cents)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

            sqlx::query(
                "UPDATE seats
                 SET status = 'BOOKED', holder_user_id = NULL, reserved_until = NULL,
                     booking_id = $2, version = version + 1
                 WHERE id = $1",
            )
            .bind(seat.id)
            .bind(booking_row.id)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;
        }

        sqlx::query(
            "UPDATE reservations SET status = 'CONFIRMED'
             WHERE seat_id = ANY($1) AND status = 'ACTIVE'",
        )
        .bind(seat_ids.iter().map(SeatId::as_raw).collect::<Vec<_>>())
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

        tx.commit().await.map_err(infra)?;

        metrics::counter!("ticketing_bookings_total", "outcome" => "pending").increment(1);

        Ok(booking_row.into())
    }

    // ---- C4.3 confirm_payment / fail_payment -------------------------------

    /// Finalizes a booking after the payment gateway reports success.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the booking does not exist.
    /// - [`CoreError::Forbidden`] if `user` does not own the booking.
    /// - [`CoreError::StateMismatch`] if the booking is not `PENDING`.
    pub async fn confirm_payment(
        &self,
        booking_id: BookingId,
        user: &UserId,
        payment_id: &str,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(infra)?;
        let booking = lock_booking(&mut tx, booking_id).await?;

        if booking.user_id != user.as_str() {
            return Err(CoreError::Forbidden);
        }
        if parse_booking_status(&booking.status) != BookingStatus::Pending {
            return Err(CoreError::StateMismatch(format!(
                "booking {booking_id} is not PENDING"
            )));
        }

        let row: BookingRow = sqlx::query_as(
            "UPDATE bookings
             SET status = 'CONFIRMED', payment_status = 'SUCCESS', payment_id = $2,
                 confirmed_at = now()
             WHERE id = $1
             RETURNING id, event_id, user_id, total_amount_cents, status::TEXT AS status,
                       payment_status::TEXT AS payment_status, payment_id,
                       booking_reference, created_at, confirmed_at",
        )
        .bind(booking_id.as_raw())
        .bind(payment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;

        tx.commit().await.map_err(infra)?;
        metrics::counter!("ticketing_payments_total", "outcome" => "succeeded").increment(1);
        Ok(row.into())
    }

    /// Releases a booking's seats after the payment gateway reports failure.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the booking does not exist.
    /// - [`CoreError::Forbidden`] if `user` does not own the booking.
    /// - [`CoreError::StateMismatch`] if the booking is not `PENDING`.
    pub async fn fail_payment(
        &self,
        booking_id: BookingId,
        user: &UserId,
        payment_id: &str,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(infra)?;
        let booking = lock_booking(&mut tx, booking_id).await?;

        if booking.user_id != user.as_str() {
            return Err(CoreError::Forbidden);
        }
        if parse_booking_status(&booking.status) != BookingStatus::Pending {
            return Err(CoreError::StateMismatch(format!(
                "booking {booking_id} is not PENDING"
            )));
        }

        release_booking_seats(&mut tx, booking_id, EventId::from_raw(booking.event_id)).await?;

        let row: BookingRow = sqlx::query_as(
            "UPDATE bookings
             SET status = 'FAILED', payment_status = 'FAILED', payment_id = $2
             WHERE id = $1
             RETURNING id, event_id, user_id, total_amount_cents, status::TEXT AS status,
                       payment_status::TEXT AS payment_status, payment_id,
                       booking_reference, created_at, confirmed_at",
        )
        .bind(booking_id.as_raw())
        .bind(payment_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;

        tx.commit().await.map_err(infra)?;
        metrics::counter!("ticketing_payments_total", "outcome" => "failed").increment(1);
        Ok(row.into())
    }

    // ---- C4.4 cancellation / extension -------------------------------------

    /// Cancels a booking and releases its seats, per §4.3.4.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the booking does not exist.
    /// - [`CoreError::Forbidden`] if `user` does not own the booking.
    /// - [`CoreError::StateMismatch`] if the booking is already terminal.
    pub async fn cancel_booking(&self, booking_id: BookingId, user: &UserId) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(infra)?;
        let booking = lock_booking(&mut tx, booking_id).await?;

        if booking.user_id != user.as_str() {
            return Err(CoreError::Forbidden);
        }
        let status = parse_booking_status(&booking.status);
        if matches!(status, BookingStatus::Cancelled | BookingStatus::Failed) {
            return Err(CoreError::StateMismatch(format!(
                "booking {booking_id} is already {status:?}"
            )));
        }

        release_booking_seats(&mut tx, booking_id, EventId::from_raw(booking.event_id)).await?;

        let row: BookingRow = sqlx::query_as(
            "UPDATE bookings SET status = 'CANCELLED' WHERE id = $1
             RETURNING id, event_id, user_id, total_amount_cents, status::TEXT AS status,
                       payment_status::TEXT AS payment_status, payment_id,
                       booking_reference, created_at, confirmed_at",
        )
        .bind(booking_id.as_raw())
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;

        tx.commit().await.map_err(infra)?;
        metrics::counter!("ticketing_bookings_total", "outcome" => "cancelled").increment(1);
        Ok(row.into())
    }

    /// Cancels an active reservation and returns its seat to `AVAILABLE`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the reservation does not exist.
    /// - [`CoreError::Forbidden`] if `user` does not own the reservation.
    /// - [`CoreError::StateMismatch`] if the reservation is not `ACTIVE`.
    pub async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        user: &UserId,
    ) -> CoreResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(infra)?;
        let reservation = lock_reservation(&mut tx, reservation_id).await?;

        if reservation.user_id != user.as_str() {
            return Err(CoreError::Forbidden);
        }
        if parse_reservation_status(&reservation.status) != ReservationStatus::Active {
            return Err(CoreError::StateMismatch(format!(
                "reservation {reservation_id} is not ACTIVE"
            )));
        }

        let seat: SeatRow = sqlx::query_as(
            "SELECT id, event_id, seat_number, section, row_label, seat_type::TEXT AS seat_type,
                    price_cents, status::TEXT AS status, version, holder_user_id,
                    reserved_until, booking_id
             FROM seats WHERE id = $1 FOR UPDATE",
        )
        .bind(reservation.seat_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;

        if parse_seat_status(&seat.status) == SeatStatus::Reserved {
            sqlx::query(
                "UPDATE seats
                 SET status = 'AVAILABLE', holder_user_id = NULL, reserved_until = NULL,
                     version = version + 1
                 WHERE id = $1",
            )
            .bind(seat.id)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

            sqlx::query("UPDATE events SET available_seats = available_seats + 1 WHERE id = $1")
                .bind(reservation.event_id)
                .execute(&mut *tx)
                .await
                .map_err(infra)?;
        }

        let row: ReservationRow = sqlx::query_as(
            "UPDATE reservations SET status = 'CANCELLED' WHERE id = $1
             RETURNING id, seat_id, event_id, user_id, session_id, expires_at,
                       status::TEXT AS status, created_at",
        )
        .bind(reservation_id.as_raw())
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;

        tx.commit().await.map_err(infra)?;
        metrics::counter!("ticketing_reservations_total", "outcome" => "cancelled").increment(1);
        Ok(row.into())
    }

    /// Extends an active reservation's hold deadline by `minutes`, bounded
    /// to `[1, 15]`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidInput`] if `minutes` is outside `[1, 15]`.
    /// - [`CoreError::NotFound`] if the reservation does not exist.
    /// - [`CoreError::Forbidden`] if `user` does not own the reservation.
    /// - [`CoreError::StateMismatch`] if the reservation is not `ACTIVE`.
    pub async fn extend_reservation(
        &self,
        reservation_id: ReservationId,
        user: &UserId,
        minutes: i64,
    ) -> CoreResult<Reservation> {
        if !(1..=15).contains(&minutes) {
            return Err(CoreError::InvalidInput(format!(
                "extension minutes {minutes} must be between 1 and 15"
            )));
        }

        let mut tx = self.pool.begin().await.map_err(infra)?;
        let reservation = lock_reservation(&mut tx, reservation_id).await?;

        if reservation.user_id != user.as_str() {
            return Err(CoreError::Forbidden);
        }
        if parse_reservation_status(&reservation.status) != ReservationStatus::Active {
            return Err(CoreError::StateMismatch(format!(
                "reservation {reservation_id} is not ACTIVE"
            )));
        }

        let new_expiry = reservation.expires_at + chrono::Duration::minutes(minutes);

        sqlx::query(
            "UPDATE seats SET reserved_until = $2, version = version + 1 WHERE id = $1",
        )
        .bind(reservation.seat_id)
        .bind(new_expiry)
        .execute(&mut *tx)
        .await
        .map_err(infra)?;

        let row: ReservationRow = sqlx::query_as(
            "UPDATE reservations SET expires_at = $2 WHERE id = $1
             RETURNING id, seat_id, event_id, user_id, session_id, expires_at,
                       status::TEXT AS status, created_at",
        )
        .bind(reservation_id.as_raw())
        .bind(new_expiry)
        .fetch_one(&mut *tx)
        .await
        .map_err(infra)?;

        tx.commit().await.map_err(infra)?;
        metrics::counter!("ticketing_reservations_total", "outcome" => "extended").increment(1);
        Ok(row.into())
    }

    // ---- C8 reclaimer -------------------------------------------------------

    /// Expires reservations past their hold deadline and returns seats still
    /// `RESERVED` to `AVAILABLE`, per §4.7. Returns the number of
    /// reservations expired.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InfraUnavailable`] if the tick cannot complete;
    /// callers should log and retry on the next timer firing rather than
    /// treat this as fatal.
    pub async fn reclaim_expired(&self) -> CoreResult<usize> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        let expired: Vec<ReservationRow> = sqlx::query_as(
            "SELECT id, seat_id, event_id, user_id, session_id, expires_at,
                    status::TEXT AS status, created_at
             FROM reservations
             WHERE status = 'ACTIVE' AND expires_at < now()
             ORDER BY id
             FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(infra)?;

        for reservation in &expired {
            let seat: SeatRow = sqlx::query_as(
                "SELECT id, event_id, seat_number, section, row_label,
                        seat_type::TEXT AS seat_type, price_cents, status::TEXT AS status,
                        version, holder_user_id, reserved_until, booking_id
                 FROM seats WHERE id = $1 FOR UPDATE",
            )
            .bind(reservation.seat_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(infra)?;

            if parse_seat_status(&seat.status) == SeatStatus::Reserved {
                sqlx::query(
                    "UPDATE seats
                     SET status = 'AVAILABLE', holder_user_id = NULL, reserved_until = NULL,
                         version = version + 1
                     WHERE id = $1",
                )
                .bind(seat.id)
                .execute(&mut *tx)
                .await
                .map_err(infra)?;

                sqlx::query(
                    "UPDATE events SET available_seats = available_seats + 1 WHERE id = $1",
                )
                .bind(reservation.event_id)
                .execute(&mut *tx)
                .await
                .map_err(infra)?;
            }

            sqlx::query("UPDATE reservations SET status = 'EXPIRED' WHERE id = $1")
                .bind(reservation.id)
                .execute(&mut *tx)
                .await
                .map_err(infra)?;
        }

        tx.commit().await.map_err(infra)?;

        if !expired.is_empty() {
            metrics::counter!("ticketing_reservations_total", "outcome" => "expired")
                .increment(expired.len() as u64);
        }

        Ok(expired.len())
    }
}

async fn lock_event(tx: &mut Transaction<'_, Postgres>, event_id: EventId) -> CoreResult<EventRow> {
    sqlx::query_as::<_, EventRow>(
        "SELECT id, name, event_time, venue, total_seats, available_seats,
                status::TEXT AS status, sale_starts_at, created_at
         FROM events WHERE id = $1 FOR UPDATE",
    )
    .bind(event_id.as_raw())
    .fetch_optional(&mut **tx)
    .await
    .map_err(infra)?
    .ok_or_else(|| CoreError::NotFound(format!("event {event_id}")))
}

async fn lock_booking(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
) -> CoreResult<BookingRow> {
    sqlx::query_as::<_, BookingRow>(
        "SELECT id, event_id, user_id, total_amount_cents, status::TEXT AS status,
                payment_status::TEXT AS payment_status, payment_id,
                booking_reference, created_at, confirmed_at
         FROM bookings WHERE id = $1 FOR UPDATE",
    )
    .bind(booking_id.as_raw())
    .fetch_optional(&mut **tx)
    .await
    .map_err(infra)?
    .ok_or_else(|| CoreError::NotFound(format!("booking {booking_id}")))
}

async fn lock_reservation(
    tx: &mut Transaction<'_, Postgres>,
    reservation_id: ReservationId,
) -> CoreResult<ReservationRow> {
    sqlx::query_as::<_, ReservationRow>(
        "SELECT id, seat_id, event_id, user_id, session_id, expires_at,
                status::TEXT AS status, created_at
         FROM reservations WHERE id = $1 FOR UPDATE",
    )
    .bind(reservation_id.as_raw())
    .fetch_optional(&mut **tx)
    .await
    .map_err(infra)?
    .ok_or_else(|| CoreError::NotFound(format!("reservation {reservation_id}")))
}

/// Loads `seat_ids` with `ORDER BY id FOR UPDATE` and confirms none are
/// missing - the ordering prevents deadlock against any other transaction
/// locking an overlapping seat set (§4.2).
async fn lock_seats(
    tx: &mut Transaction<'_, Postgres>,
    seat_ids: &[SeatId],
) -> CoreResult<Vec<SeatRow>> {
    let ids: Vec<i64> = seat_ids.iter().map(SeatId::as_raw).collect();
    let rows: Vec<SeatRow> = sqlx::query_as(
        "SELECT id, event_id, seat_number, section, row_label, seat_type::TEXT AS seat_type,
                price_cents, status::TEXT AS status, version, holder_user_id,
                reserved_until, booking_id
         FROM seats WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(infra)?;

    if rows.len() != seat_ids.len() {
        let found: std::collections::HashSet<i64> = rows.iter().map(|r| r.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .map(ToString::to_string)
            .collect();
        return Err(CoreError::NotFound(format!("seats {}", missing.join(", "))));
    }

    Ok(rows)
}

fn check_seats_belong_to_event(seats: &[SeatRow], event_id: EventId) -> CoreResult<()> {
    let wrong: Vec<String> = seats
        .iter()
        .filter(|s| s.event_id != event_id.as_raw())
        .map(|s| s.seat_number.clone())
        .collect();
    if wrong.is_empty() {
        Ok(())
    } else {
        Err(CoreError::WrongEvent(format!(
            "seats not in event {event_id}: {}",
            wrong.join(", ")
        )))
    }
}

fn check_seats_available(seats: &[SeatRow]) -> CoreResult<()> {
    let unavailable: Vec<String> = seats
        .iter()
        .filter(|s| parse_seat_status(&s.status) != SeatStatus::Available)
        .map(|s| s.seat_number.clone())
        .collect();
    if unavailable.is_empty() {
        Ok(())
    } else {
        Err(CoreError::unavailable(unavailable))
    }
}

/// Releases every seat attached to `booking_id` back to `AVAILABLE` and
/// credits the event's denormalized counter. Shared by `fail_payment` and
/// `cancel_booking` (§4.3.3, §4.3.4).
async fn release_booking_seats(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: BookingId,
    event_id: EventId,
) -> CoreResult<()> {
    let seats: Vec<BookingSeatRow> =
        sqlx::query_as("SELECT booking_id, seat_id, price_cents FROM booking_seats WHERE booking_id = $1")
            .bind(booking_id.as_raw())
            .fetch_all(&mut **tx)
            .await
            .map_err(infra)?;

    if seats.is_empty() {
        return Ok(());
    }

    let seat_ids: Vec<i64> = seats.iter().map(|s| s.seat_id).collect();
    sqlx::query(
        "UPDATE seats
         SET status = 'AVAILABLE', holder_user_id = NULL, reserved_until = NULL,
             booking_id = NULL, version = version + 1
         WHERE id = ANY($1)",
    )
    .bind(&seat_ids)
    .execute(&mut **tx)
    .await
    .map_err(infra)?;

    #[allow(clippy::cast_possible_wrap)]
    let released = seat_ids.len() as i64;
    sqlx::query("UPDATE events SET available_seats = available_seats + $2 WHERE id = $1")
        .bind(event_id.as_raw())
        .bind(released)
        .execute(&mut **tx)
        .await
        .map_err(infra)?;

    Ok(())
}
