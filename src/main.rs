//! BoxOffice Server — booking concurrency-coordination core
//!
//! Main entry point that wires all crates together and starts the sweeps.

use std::sync::Arc;

use boxoffice_booking::{InMemorySeatRepository, ReservationCoordinator};
use boxoffice_core::config::AppConfig;
use boxoffice_core::error::AppError;
use boxoffice_lock::{DistributedLock, LockOptions, LockStrategy};
use boxoffice_queue::AdmissionQueue;
use boxoffice_store::StoreManager;
use boxoffice_worker::{CronScheduler, ExpiryReaper};

#[tokio::main]
async fn main() {
    let env = std::env::var("BOXOFFICE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    boxoffice_core::logging::init(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting BoxOffice v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Coordination store ───────────────────────────────
    tracing::info!(provider = %config.store.provider, "Initializing coordination store...");
    let store = StoreManager::new(&config.store).await?;

    // ── Step 2: Distributed lock ─────────────────────────────────
    let lock = DistributedLock::new(store.clone());

    // ── Step 3: Admission queue ──────────────────────────────────
    let queue = AdmissionQueue::new(store.clone(), lock.clone(), config.queue.clone())
        .with_lock_options(LockOptions::from_config(&config.lock, LockStrategy::Spin));

    // ── Step 4: Reservation coordinator ──────────────────────────
    // Seat persistence is supplied by the deployment; the bundled
    // in-memory repository backs single-node use.
    let repository = Arc::new(InMemorySeatRepository::new());
    let coordinator = ReservationCoordinator::new(repository, lock, config.booking.clone());

    // ── Step 5: Expiry reaper + scheduler ────────────────────────
    let reaper = Arc::new(ExpiryReaper::new(queue, coordinator));

    if !config.worker.enabled {
        tracing::warn!("Worker disabled; stale tokens and holds will not be swept");
        shutdown_signal().await;
        tracing::info!("BoxOffice shut down");
        return Ok(());
    }

    let mut scheduler = CronScheduler::new(Arc::clone(&reaper), config.worker.clone()).await?;
    scheduler.register_default_tasks().await?;
    scheduler.start().await?;

    tracing::info!("BoxOffice ready");

    // ── Step 6: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    scheduler.shutdown().await?;

    tracing::info!("BoxOffice shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
