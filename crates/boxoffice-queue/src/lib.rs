//! # boxoffice-queue
//!
//! Capacity-bounded, FIFO admission control for the booking path. The
//! queue decides who may attempt a booking; the distributed lock decides
//! who succeeds.

mod queue;

pub use queue::AdmissionQueue;
