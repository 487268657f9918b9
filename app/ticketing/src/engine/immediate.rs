//! Immediate (v1) seat lifecycle path (C5, §4.4).
//!
//! Wraps each [`PgStore`] primitive with the distributed mutex so that two
//! requests racing for the same seats serialize at the lock rather than at
//! the database row lock alone - the row lock only protects one
//! transaction's view, not the read-check-write span across the handler
//! that decides *which* seats to touch. Locking keys:
//!
//! - `reserve`/`book`: `multi_lock` over `seat:<id>` for every seat
//!   targeted, sorted by the mutex itself (§4.1).
//! - `cancel_reservation`/`extend_reservation`: single `acquire` over
//!   `reservation:<id>`.
//! - `cancel_booking`/`confirm_payment`/`fail_payment`: single `acquire`
//!   over `booking:<id>`.

use std::time::Instant;

use ticketing_core::{
    Booking, BookingId, CoreError, Event, EventId, Reservation, ReservationId, Seat, SeatId,
    UserId,
};
use ticketing_coordination::{CoordinationError, DistributedMutex, LockGuard};
use ticketing_postgres::PgStore;
use ticketing_runtime::{LockMetrics, SeatLifecycleMetrics};

use crate::config::EngineConfig;

type CoreResult<T> = Result<T, CoreError>;

fn lock_error_to_core(err: CoordinationError) -> CoreError {
    match err {
        CoordinationError::RetriesExhausted => {
            LockMetrics::record_retries_exhausted();
            CoreError::RetryableConflict
        }
        CoordinationError::Unavailable(message) => CoreError::InfraUnavailable(message),
        CoordinationError::NotOwner { key } => {
            CoreError::InfraUnavailable(format!("lost ownership of lock {key}"))
        }
        CoordinationError::Malformed(message) => CoreError::InfraUnavailable(message),
        CoordinationError::StatusRegression { .. } => {
            CoreError::InfraUnavailable("unexpected status regression on immediate path".into())
        }
    }
}

/// Immediate-path (v1) seat lifecycle engine (C5).
#[derive(Clone)]
pub struct ImmediateEngine {
    store: PgStore,
    mutex: DistributedMutex,
    config: EngineConfig,
}

impl ImmediateEngine {
    /// Builds the immediate-path engine over a durable store and a
    /// distributed mutex.
    #[must_use]
    pub const fn new(store: PgStore, mutex: DistributedMutex, config: EngineConfig) -> Self {
        Self {
            store,
            mutex,
            config,
        }
    }

    async fn lock_seats(&self, seat_ids: &[SeatId]) -> Result<LockGuard, CoordinationError> {
        let started = Instant::now();
        let keys = seat_ids.iter().map(|id| format!("seat:{id}"));
        let guard = self
            .mutex
            .multi_lock(
                keys,
                self.config.lock_timeout(),
                self.config.lock_max_retries,
                self.config.lock_retry_delay(),
            )
            .await?;
        LockMetrics::record_acquired(started.elapsed());
        Ok(guard)
    }

    async fn lock_single(&self, key: &str) -> Result<LockGuard, CoordinationError> {
        let started = Instant::now();
        let guard = self
            .mutex
            .acquire(
                key,
                self.config.lock_timeout(),
                true,
                self.config.lock_max_retries,
                self.config.lock_retry_delay(),
            )
            .await?;
        LockMetrics::record_acquired(started.elapsed());
        Ok(guard)
    }

    async fn unlock(&self, guard: &LockGuard) {
        if let Err(err) = self.mutex.release(guard).await {
            tracing::warn!(error = %err, owner = guard.owner(), "failed to release lock");
        }
    }

    /// Reads an event (no locking - a point-in-time read).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the event does not exist.
    pub async fn get_event(&self, event_id: EventId) -> CoreResult<Event> {
        self.store.get_event(event_id).await
    }

    /// Reads a seat (no locking - a point-in-time read).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the seat does not exist.
    pub async fn get_seat(&self, seat_id: SeatId) -> CoreResult<Seat> {
        self.store.get_seat(seat_id).await
    }

    /// Reads a reservation (no locking - a point-in-time read).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the reservation does not exist.
    pub async fn get_reservation(&self, id: ReservationId) -> CoreResult<Reservation> {
        self.store.get_reservation(id).await
    }

    /// Reads a booking (no locking - a point-in-time read).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the booking does not exist.
    pub async fn get_booking(&self, id: BookingId) -> CoreResult<Booking> {
        self.store.get_booking(id).await
    }

    /// Places a hold on one or more seats (§4.3.1).
    ///
    /// # Errors
    ///
    /// See [`PgStore::reserve`]. Additionally returns
    /// [`CoreError::RetryableConflict`] if the seat locks could not be
    /// acquired within the configured retry budget.
    pub async fn reserve(
        &self,
        event_id: EventId,
        seat_ids: &[SeatId],
        user: &UserId,
        session_id: Option<String>,
    ) -> CoreResult<(Vec<Reservation>, ticketing_core::Money)> {
        self.run("reserve", self.lock_seats(seat_ids), async {
            self.store
                .reserve(
                    event_id,
                    seat_ids,
                    user,
                    session_id,
                    self.config.reservation_timeout(),
                    self.config.max_seats_per_booking,
                )
                .await
        })
        .await
    }

    /// Converts held seats into a pending booking (§4.3.2).
    ///
    /// # Errors
    ///
    /// See [`PgStore::book`]. Additionally returns
    /// [`CoreError::RetryableConflict`] if the seat locks could not be
    /// acquired within the configured retry budget.
    pub async fn book(
        &self,
        event_id: EventId,
        seat_ids: &[SeatId],
        user: &UserId,
    ) -> CoreResult<Booking> {
        self.run("book", self.lock_seats(seat_ids), async {
            self.store.book(event_id, seat_ids, user).await
        })
        .await
    }

    /// Finalizes a booking after payment succeeds (§4.3.3).
    ///
    /// # Errors
    ///
    /// See [`PgStore::confirm_payment`].
    pub async fn confirm_payment(
        &self,
        booking_id: BookingId,
        user: &UserId,
        payment_id: &str,
    ) -> CoreResult<Booking> {
        let key = format!("booking:{booking_id}");
        self.run("confirm_payment", self.lock_single(&key), async {
            self.store.confirm_payment(booking_id, user, payment_id).await
        })
        .await
    }

    /// Releases a booking's seats after payment fails (§4.3.3).
    ///
    /// # Errors
    ///
    /// See [`PgStore::fail_payment`].
    pub async fn fail_payment(
        &self,
        booking_id: BookingId,
        user: &UserId,
        payment_id: &str,
    ) -> CoreResult<Booking> {
        let key = format!("booking:{booking_id}");
        self.run("fail_payment", self.lock_single(&key), async {
            self.store.fail_payment(booking_id, user, payment_id).await
        })
        .await
    }

    /// Cancels a booking and releases its seats (§4.3.4).
    ///
    /// # Errors
    ///
    /// See [`PgStore::cancel_booking`].
    pub async fn cancel_booking(&self, booking_id: BookingId, user: &UserId) -> CoreResult<Booking> {
        let key = format!("booking:{booking_id}");
        self.run("cancel_booking", self.lock_single(&key), async {
            self.store.cancel_booking(booking_id, user).await
        })
        .await
    }

    /// Cancels an active reservation (§4.3.4).
    ///
    /// # Errors
    ///
    /// See [`PgStore::cancel_reservation`].
    pub async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        user: &UserId,
    ) -> CoreResult<Reservation> {
        let key = format!("reservation:{reservation_id}");
        self.run("cancel_reservation", self.lock_single(&key), async {
            self.store.cancel_reservation(reservation_id, user).await
        })
        .await
    }

    /// Extends an active reservation's hold deadline (§4.3.4).
    ///
    /// # Errors
    ///
    /// See [`PgStore::extend_reservation`].
    pub async fn extend_reservation(
        &self,
        reservation_id: ReservationId,
        user: &UserId,
        minutes: i64,
    ) -> CoreResult<Reservation> {
        let key = format!("reservation:{reservation_id}");
        self.run("extend_reservation", self.lock_single(&key), async {
            self.store
                .extend_reservation(reservation_id, user, minutes)
                .await
        })
        .await
    }

    /// Acquires `lock`, runs `body`, always releases the lock, and records
    /// seat-lifecycle operation metrics around the whole thing.
    async fn run<L, B, T>(&self, name: &'static str, lock: L, body: B) -> CoreResult<T>
    where
        L: std::future::Future<Output = Result<LockGuard, CoordinationError>>,
        B: std::future::Future<Output = CoreResult<T>>,
    {
        let started = Instant::now();
        let guard = lock.await.map_err(lock_error_to_core)?;
        let result = body.await;
        self.unlock(&guard).await;

        SeatLifecycleMetrics::record_operation(name, started.elapsed());
        if let Err(ref err) = result {
            SeatLifecycleMetrics::record_error(name, err.code());
        }
        result
    }
}
