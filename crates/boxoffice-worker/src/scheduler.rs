//! Cron scheduler for the periodic sweeps.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use boxoffice_core::config::worker::WorkerConfig;
use boxoffice_core::error::AppError;

use crate::reaper::ExpiryReaper;

/// Cron-based scheduler driving the reaper on a fixed cadence.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// The reaper invoked by each scheduled task.
    reaper: Arc<ExpiryReaper>,
    /// Cron expressions for each task.
    config: WorkerConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(reaper: Arc<ExpiryReaper>, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            reaper,
            config,
        })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_drain_tick().await?;
        self.register_token_sweep().await?;
        self.register_hold_sweep().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Queue drain tick — fills freed admission slots between completions.
    async fn register_drain_tick(&self) -> Result<(), AppError> {
        let reaper = Arc::clone(&self.reaper);
        let job = CronJob::new_async(self.config.drain_cron.as_str(), move |_uuid, _lock| {
            let reaper = Arc::clone(&reaper);
            Box::pin(async move {
                let admitted = reaper.drain_tick().await;
                if admitted > 0 {
                    tracing::debug!(admitted, "Drain tick admitted waiters");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create drain schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add drain schedule: {}", e)))?;

        tracing::info!(cron = %self.config.drain_cron, "Registered: queue drain tick");
        Ok(())
    }

    /// Stale token sweep.
    async fn register_token_sweep(&self) -> Result<(), AppError> {
        let reaper = Arc::clone(&self.reaper);
        let job = CronJob::new_async(self.config.token_sweep_cron.as_str(), move |_uuid, _lock| {
            let reaper = Arc::clone(&reaper);
            Box::pin(async move {
                let expired = reaper.sweep_tokens().await;
                if expired > 0 {
                    tracing::debug!(expired, "Token sweep expired stale tokens");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create token sweep schedule: {}", e)))?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add token sweep schedule: {}", e))
        })?;

        tracing::info!(cron = %self.config.token_sweep_cron, "Registered: token sweep");
        Ok(())
    }

    /// Expired hold sweep.
    async fn register_hold_sweep(&self) -> Result<(), AppError> {
        let reaper = Arc::clone(&self.reaper);
        let job = CronJob::new_async(self.config.hold_sweep_cron.as_str(), move |_uuid, _lock| {
            let reaper = Arc::clone(&reaper);
            Box::pin(async move {
                let reverted = reaper.sweep_holds().await;
                if reverted > 0 {
                    tracing::debug!(reverted, "Hold sweep reverted lapsed holds");
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create hold sweep schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add hold sweep schedule: {}", e)))?;

        tracing::info!(cron = %self.config.hold_sweep_cron, "Registered: hold sweep");
        Ok(())
    }
}
