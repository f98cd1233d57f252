//! Shared domain types used across BoxOffice crates.

pub mod id;
pub mod reservation;
pub mod token;

pub use id::{ReservationId, SeatId, TokenId, UserId};
pub use reservation::{Reservation, SeatState};
pub use token::{AdmissionToken, TokenStatus};
