//! # boxoffice-booking
//!
//! The seat reservation state machine, serialized per seat through the
//! distributed lock so that at most one concurrent booking attempt can
//! succeed on any seat.

mod coordinator;
mod memory;

pub use coordinator::ReservationCoordinator;
pub use memory::InMemorySeatRepository;
