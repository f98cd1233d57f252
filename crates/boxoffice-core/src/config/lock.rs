//! Distributed lock configuration.

use serde::{Deserialize, Serialize};

/// Distributed lock acquisition budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// TTL of a held lock record in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    /// Maximum total time to wait for acquisition in milliseconds.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// Sleep between spin attempts in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Maximum number of spin attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_ttl_ms() -> u64 {
    10_000
}

fn default_wait_timeout_ms() -> u64 {
    5_000
}

fn default_retry_interval_ms() -> u64 {
    50
}

fn default_max_retries() -> u32 {
    100
}
