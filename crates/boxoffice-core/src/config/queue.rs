//! Admission queue configuration.

use serde::{Deserialize, Serialize};

/// Capacity and expiry settings for the token admission queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of simultaneously active tokens.
    #[serde(default = "default_max_active")]
    pub max_active: u64,
    /// TTL of an active token in seconds.
    #[serde(default = "default_active_ttl")]
    pub active_ttl_secs: u64,
    /// Estimated admissions per minute, used for wait-time reporting only.
    #[serde(default = "default_admissions_per_minute")]
    pub admissions_per_minute: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_active: default_max_active(),
            active_ttl_secs: default_active_ttl(),
            admissions_per_minute: default_admissions_per_minute(),
        }
    }
}

fn default_max_active() -> u64 {
    100
}

fn default_active_ttl() -> u64 {
    600
}

fn default_admissions_per_minute() -> u64 {
    60
}
