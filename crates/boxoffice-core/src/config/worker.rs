//! Background reaper configuration.

use serde::{Deserialize, Serialize};

/// Settings for the periodic sweep worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the queue drain tick.
    #[serde(default = "default_drain_cron")]
    pub drain_cron: String,
    /// Cron expression for the stale-token sweep.
    #[serde(default = "default_token_sweep_cron")]
    pub token_sweep_cron: String,
    /// Cron expression for the expired-hold sweep.
    #[serde(default = "default_hold_sweep_cron")]
    pub hold_sweep_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            drain_cron: default_drain_cron(),
            token_sweep_cron: default_token_sweep_cron(),
            hold_sweep_cron: default_hold_sweep_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_drain_cron() -> String {
    // Every 5 seconds
    "*/5 * * * * *".to_string()
}

fn default_token_sweep_cron() -> String {
    // Every minute
    "0 * * * * *".to_string()
}

fn default_hold_sweep_cron() -> String {
    // Every minute, offset from the token sweep
    "30 * * * * *".to_string()
}
