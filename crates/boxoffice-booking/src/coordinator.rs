//! The seat reservation coordinator.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use boxoffice_core::config::booking::BookingConfig;
use boxoffice_core::error::AppError;
use boxoffice_core::result::AppResult;
use boxoffice_core::traits::seats::SeatRepository;
use boxoffice_core::types::id::{ReservationId, SeatId, UserId};
use boxoffice_core::types::reservation::{Reservation, SeatState};
use boxoffice_lock::{DistributedLock, LockOptions, LockStrategy};
use boxoffice_store::keys;

/// Serializes all state-changing operations on a seat.
///
/// Every transition takes the seat's lock first and reads the current
/// state only after the lock is held. Deciding before locking would let
/// two callers both observe `Available` and both hold the seat.
#[derive(Debug, Clone)]
pub struct ReservationCoordinator {
    repository: Arc<dyn SeatRepository>,
    lock: DistributedLock,
    config: BookingConfig,
    seat_lock_options: LockOptions,
}

impl ReservationCoordinator {
    /// Create a new coordinator.
    pub fn new(
        repository: Arc<dyn SeatRepository>,
        lock: DistributedLock,
        config: BookingConfig,
    ) -> Self {
        let seat_lock_options = LockOptions::default()
            .with_strategy(LockStrategy::Spin)
            .with_wait_timeout(Duration::from_millis(config.seat_lock_wait_ms));
        Self {
            repository,
            lock,
            config,
            seat_lock_options,
        }
    }

    /// Place a temporary hold on a seat.
    ///
    /// Fails with `SeatUnavailable` unless the seat is `Available` (an
    /// already-lapsed hold is reverted first and does not block).
    pub async fn hold(&self, seat_id: SeatId, user_id: UserId) -> AppResult<Reservation> {
        let guard = [keys::seat_op(seat_id)];
        self.lock
            .with_lock(&guard, &self.seat_lock_options, || {
                self.hold_locked(seat_id, user_id)
            })
            .await
    }

    /// The hold body; must only run under the seat's lock.
    async fn hold_locked(&self, seat_id: SeatId, user_id: UserId) -> AppResult<Reservation> {
        let now = Utc::now();
        let mut state = self
            .repository
            .seat_state(seat_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No seat {seat_id}")))?;

        if state.is_expired_hold(now) {
            self.revert_seat(seat_id).await?;
            state = SeatState::Available;
        }

        if state != SeatState::Available {
            return Err(AppError::seat_unavailable(format!(
                "Seat {seat_id} is not available"
            )));
        }

        let expires_at = now + chrono::Duration::seconds(self.config.hold_ttl_secs as i64);
        let reservation = Reservation::hold(seat_id, user_id, expires_at);
        self.repository.insert_reservation(&reservation).await?;
        self.repository
            .update_seat_state(seat_id, SeatState::Held { expires_at })
            .await?;

        info!(seat_id = %seat_id, user_id = %user_id, reservation_id = %reservation.id, "Seat held");
        Ok(reservation)
    }

    /// Confirm a held reservation, making the booking final.
    pub async fn confirm(&self, reservation_id: ReservationId) -> AppResult<Reservation> {
        let reservation = self.require_reservation(reservation_id).await?;
        let guard = [
            keys::seat_op(reservation.seat_id),
            keys::reservation_confirm(reservation_id),
        ];
        self.lock
            .with_lock(&guard, &self.seat_lock_options, || {
                self.confirm_locked(reservation_id)
            })
            .await
    }

    /// The confirm body; must only run under the seat's lock.
    async fn confirm_locked(&self, reservation_id: ReservationId) -> AppResult<Reservation> {
        // Re-read under the lock; the pre-lock read only located the seat.
        let mut reservation = self.require_reservation(reservation_id).await?;
        if reservation.is_confirmed() {
            return Err(AppError::invalid_reservation_state(format!(
                "Reservation {reservation_id} is already confirmed"
            )));
        }

        let now = Utc::now();
        if reservation.is_expired(now) {
            return Err(AppError::reservation_expired(format!(
                "Reservation {reservation_id} lapsed before confirmation"
            )));
        }

        reservation.confirmed_at = Some(now);
        self.repository.update_reservation(&reservation).await?;
        self.repository
            .update_seat_state(reservation.seat_id, SeatState::Confirmed)
            .await?;

        info!(reservation_id = %reservation_id, seat_id = %reservation.seat_id, "Reservation confirmed");
        Ok(reservation)
    }

    /// Cancel a held reservation, returning the seat to `Available`.
    ///
    /// Only the reservation's owner may cancel it.
    pub async fn cancel(&self, reservation_id: ReservationId, user_id: UserId) -> AppResult<()> {
        let reservation = self.require_reservation(reservation_id).await?;
        let guard = [
            keys::seat_op(reservation.seat_id),
            keys::reservation_cancel(reservation_id),
        ];
        self.lock
            .with_lock(&guard, &self.seat_lock_options, || {
                self.cancel_locked(reservation_id, user_id)
            })
            .await
    }

    /// The cancel body; must only run under the seat's lock.
    async fn cancel_locked(&self, reservation_id: ReservationId, user_id: UserId) -> AppResult<()> {
        let reservation = self.require_reservation(reservation_id).await?;

        if reservation.user_id != user_id {
            return Err(AppError::invalid_reservation_state(format!(
                "Reservation {reservation_id} is not owned by caller"
            )));
        }
        if reservation.is_confirmed() {
            return Err(AppError::invalid_reservation_state(format!(
                "Reservation {reservation_id} is already confirmed"
            )));
        }

        self.repository.delete_reservation(reservation_id).await?;
        self.repository
            .update_seat_state(reservation.seat_id, SeatState::Available)
            .await?;

        info!(reservation_id = %reservation_id, seat_id = %reservation.seat_id, "Reservation cancelled");
        Ok(())
    }

    /// Revert every lapsed hold to `Available`.
    ///
    /// Returns the number of holds reverted. A failure on one seat is
    /// logged and does not abort the sweep of the remaining seats.
    pub async fn reap_expired_holds(&self) -> AppResult<u64> {
        let held = self.repository.held_reservations().await?;
        let now = Utc::now();
        let mut reverted = 0u64;

        for reservation in held {
            if !reservation.is_expired(now) {
                continue;
            }
            match self.reap_hold(&reservation).await {
                Ok(true) => reverted += 1,
                Ok(false) => {}
                Err(e) => {
                    error!(
                        reservation_id = %reservation.id,
                        seat_id = %reservation.seat_id,
                        error = %e,
                        "Failed to reap expired hold, continuing sweep"
                    );
                }
            }
        }

        if reverted > 0 {
            info!(reverted, "Reaped expired seat holds");
        }
        Ok(reverted)
    }

    /// Revert one lapsed hold under its seat's lock.
    async fn reap_hold(&self, reservation: &Reservation) -> AppResult<bool> {
        let guard = [keys::seat_op(reservation.seat_id)];
        self.lock
            .with_lock(&guard, &self.seat_lock_options, || async {
                // Re-check under the lock; the hold may have been
                // confirmed or cancelled since the scan.
                let Some(current) = self.repository.reservation(reservation.id).await? else {
                    return Ok(false);
                };
                if current.is_confirmed() || !current.is_expired(Utc::now()) {
                    return Ok(false);
                }

                self.repository.delete_reservation(current.id).await?;
                self.repository
                    .update_seat_state(current.seat_id, SeatState::Available)
                    .await?;
                Ok(true)
            })
            .await
    }

    /// Revert a seat with a lapsed hold back to `Available`.
    async fn revert_seat(&self, seat_id: SeatId) -> AppResult<()> {
        if let Some(existing) = self.repository.reservation_for_seat(seat_id).await? {
            self.repository.delete_reservation(existing.id).await?;
        }
        self.repository
            .update_seat_state(seat_id, SeatState::Available)
            .await
    }

    /// Look up a reservation or fail with `NotFound`.
    async fn require_reservation(&self, id: ReservationId) -> AppResult<Reservation> {
        self.repository
            .reservation(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No reservation {id}")))
    }
}
