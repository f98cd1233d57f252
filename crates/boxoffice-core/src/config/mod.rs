//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod booking;
pub mod lock;
pub mod logging;
pub mod queue;
pub mod store;
pub mod worker;

use serde::{Deserialize, Serialize};

use self::booking::BookingConfig;
use self::lock::LockConfig;
use self::logging::LoggingConfig;
use self::queue::QueueConfig;
use self::store::StoreConfig;
use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Coordination store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Distributed lock settings.
    #[serde(default)]
    pub lock: LockConfig,
    /// Admission queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Seat booking settings.
    #[serde(default)]
    pub booking: BookingConfig,
    /// Background reaper settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `BOXOFFICE_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BOXOFFICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
