//! Seat repository trait — the persistence collaborator for seat state.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::{ReservationId, SeatId};
use crate::types::reservation::{Reservation, SeatState};

/// Trait for the seat-state persistence collaborator.
///
/// The coordinator only ever reads or mutates seat state while holding the
/// seat's distributed lock, so implementations do not need their own
/// cross-process serialization; they only need each call to be internally
/// consistent.
#[async_trait]
pub trait SeatRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Current state of a seat, or `None` if the seat is unknown.
    async fn seat_state(&self, seat_id: SeatId) -> AppResult<Option<SeatState>>;

    /// Overwrite the state of a seat.
    async fn update_seat_state(&self, seat_id: SeatId, state: SeatState) -> AppResult<()>;

    /// Persist a new reservation record.
    async fn insert_reservation(&self, reservation: &Reservation) -> AppResult<()>;

    /// Look up a reservation by identifier.
    async fn reservation(&self, id: ReservationId) -> AppResult<Option<Reservation>>;

    /// The reservation currently associated with a seat, if any.
    async fn reservation_for_seat(&self, seat_id: SeatId) -> AppResult<Option<Reservation>>;

    /// Overwrite an existing reservation record.
    async fn update_reservation(&self, reservation: &Reservation) -> AppResult<()>;

    /// Discard a reservation record.
    async fn delete_reservation(&self, id: ReservationId) -> AppResult<()>;

    /// All reservations whose seat is currently held (confirmed excluded).
    async fn held_reservations(&self) -> AppResult<Vec<Reservation>>;
}
