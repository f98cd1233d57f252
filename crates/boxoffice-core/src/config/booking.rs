//! Seat booking configuration.

use serde::{Deserialize, Serialize};

/// Settings for seat holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// TTL of a seat hold in seconds before it lapses unconfirmed.
    #[serde(default = "default_hold_ttl")]
    pub hold_ttl_secs: u64,
    /// Maximum time in milliseconds to wait for a seat's lock.
    #[serde(default = "default_seat_lock_wait_ms")]
    pub seat_lock_wait_ms: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            hold_ttl_secs: default_hold_ttl(),
            seat_lock_wait_ms: default_seat_lock_wait_ms(),
        }
    }
}

fn default_hold_ttl() -> u64 {
    300
}

fn default_seat_lock_wait_ms() -> u64 {
    1_000
}
