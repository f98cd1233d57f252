//! In-memory seat repository for single-node deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use boxoffice_core::result::AppResult;
use boxoffice_core::traits::seats::SeatRepository;
use boxoffice_core::types::id::{ReservationId, SeatId};
use boxoffice_core::types::reservation::{Reservation, SeatState};

/// Internal state for the memory-based seat repository.
#[derive(Debug, Default)]
struct Inner {
    seats: HashMap<SeatId, SeatState>,
    reservations: HashMap<ReservationId, Reservation>,
}

/// In-memory seat repository using a Tokio mutex for thread safety.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeatRepository {
    /// Protected inner state.
    inner: Arc<Mutex<Inner>>,
}

impl InMemorySeatRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a seat in `Available` state.
    pub async fn add_seat(&self, seat_id: SeatId) {
        let mut inner = self.inner.lock().await;
        inner.seats.insert(seat_id, SeatState::Available);
    }

    /// Seed a seat in an arbitrary state.
    pub async fn add_seat_with_state(&self, seat_id: SeatId, state: SeatState) {
        let mut inner = self.inner.lock().await;
        inner.seats.insert(seat_id, state);
    }
}

#[async_trait]
impl SeatRepository for InMemorySeatRepository {
    async fn seat_state(&self, seat_id: SeatId) -> AppResult<Option<SeatState>> {
        let inner = self.inner.lock().await;
        Ok(inner.seats.get(&seat_id).copied())
    }

    async fn update_seat_state(&self, seat_id: SeatId, state: SeatState) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.seats.insert(seat_id, state);
        Ok(())
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn reservation(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        let inner = self.inner.lock().await;
        Ok(inner.reservations.get(&id).cloned())
    }

    async fn reservation_for_seat(&self, seat_id: SeatId) -> AppResult<Option<Reservation>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .reservations
            .values()
            .find(|r| r.seat_id == seat_id)
            .cloned())
    }

    async fn update_reservation(&self, reservation: &Reservation) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn delete_reservation(&self, id: ReservationId) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        inner.reservations.remove(&id);
        Ok(())
    }

    async fn held_reservations(&self) -> AppResult<Vec<Reservation>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .reservations
            .values()
            .filter(|r| !r.is_confirmed())
            .cloned()
            .collect())
    }
}
