//! # boxoffice-worker
//!
//! The expiry reaper and its cron wiring. An external scheduler concern
//! drives the sweeps; the reaper itself only knows how to expire stale
//! admission tokens and revert lapsed seat holds.

mod reaper;
mod scheduler;

pub use reaper::{ExpiryReaper, SweepOutcome};
pub use scheduler::CronScheduler;
