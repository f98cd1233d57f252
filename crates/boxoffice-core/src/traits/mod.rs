//! Core traits defined in `boxoffice-core` and implemented by other crates.

pub mod seats;
pub mod store;

pub use seats::SeatRepository;
pub use store::{LockStore, Subscription};
