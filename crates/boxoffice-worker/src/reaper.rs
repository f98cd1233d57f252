//! Periodic expiry sweeps over tokens and seat holds.

use tracing::{debug, error};

use boxoffice_booking::ReservationCoordinator;
use boxoffice_queue::AdmissionQueue;

/// What one full sweep accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Stale active tokens expired.
    pub tokens_expired: u64,
    /// Waiting tokens admitted into slots the sweep freed.
    pub slots_refilled: u64,
    /// Lapsed seat holds reverted to available.
    pub holds_reverted: u64,
}

/// Handles periodic cleanup of stale admission tokens and lapsed holds.
///
/// Each phase isolates its own failures: one failing phase is logged and
/// never aborts the others, so a bad record in the queue cannot stop
/// expired holds from being reverted.
#[derive(Clone)]
pub struct ExpiryReaper {
    /// Admission queue for the token sweep and refill drain.
    queue: AdmissionQueue,
    /// Coordinator for the seat-hold sweep.
    coordinator: ReservationCoordinator,
}

impl std::fmt::Debug for ExpiryReaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiryReaper").finish()
    }
}

impl ExpiryReaper {
    /// Creates a new reaper over the queue and coordinator.
    pub fn new(queue: AdmissionQueue, coordinator: ReservationCoordinator) -> Self {
        Self { queue, coordinator }
    }

    /// Expire stale active tokens. Returns the number expired.
    pub async fn sweep_tokens(&self) -> u64 {
        match self.queue.reap_expired().await {
            Ok(expired) => expired.len() as u64,
            Err(e) => {
                error!(error = %e, "Token sweep failed");
                0
            }
        }
    }

    /// Refill freed admission slots. Returns the number admitted.
    pub async fn drain_tick(&self) -> u64 {
        match self.queue.drain().await {
            Ok(admitted) => admitted,
            Err(e) => {
                error!(error = %e, "Queue drain tick failed");
                0
            }
        }
    }

    /// Revert lapsed seat holds. Returns the number reverted.
    pub async fn sweep_holds(&self) -> u64 {
        match self.coordinator.reap_expired_holds().await {
            Ok(reverted) => reverted,
            Err(e) => {
                error!(error = %e, "Hold sweep failed");
                0
            }
        }
    }

    /// Run every phase once: expire tokens, refill slots, revert holds.
    pub async fn run_sweep(&self) -> SweepOutcome {
        let outcome = SweepOutcome {
            tokens_expired: self.sweep_tokens().await,
            slots_refilled: self.drain_tick().await,
            holds_reverted: self.sweep_holds().await,
        };
        debug!(?outcome, "Sweep finished");
        outcome
    }
}
