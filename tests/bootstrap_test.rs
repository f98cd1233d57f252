//! Integration tests for server bootstrap: configuration loading and
//! full subsystem wiring against the in-memory backends.

use std::sync::Arc;

use boxoffice_booking::{InMemorySeatRepository, ReservationCoordinator};
use boxoffice_core::config::AppConfig;
use boxoffice_core::traits::seats::SeatRepository;
use boxoffice_core::types::id::{SeatId, UserId};
use boxoffice_core::types::reservation::SeatState;
use boxoffice_lock::{DistributedLock, LockOptions, LockStrategy};
use boxoffice_queue::AdmissionQueue;
use boxoffice_store::StoreManager;
use boxoffice_worker::{CronScheduler, ExpiryReaper};

#[tokio::test]
async fn test_config_loads_defaults_from_toml() {
    let config = AppConfig::load("development").expect("config should load");

    assert_eq!(config.store.provider, "memory");
    assert_eq!(config.lock.ttl_ms, 10_000);
    assert_eq!(config.lock.wait_timeout_ms, 5_000);
    assert_eq!(config.queue.max_active, 100);
    assert_eq!(config.booking.hold_ttl_secs, 300);
    assert!(config.worker.enabled);
}

#[tokio::test]
async fn test_full_stack_wires_and_books_a_seat() {
    let config = AppConfig::load("development").expect("config should load");

    let store = StoreManager::new(&config.store)
        .await
        .expect("memory store should initialize");
    let lock = DistributedLock::new(store.clone());
    let queue = AdmissionQueue::new(store, lock.clone(), config.queue.clone())
        .with_lock_options(LockOptions::from_config(&config.lock, LockStrategy::Spin));
    let repository = Arc::new(InMemorySeatRepository::new());
    let coordinator = ReservationCoordinator::new(repository.clone(), lock, config.booking.clone());

    // Admission gate, then the booking round trip.
    let token = queue.enroll(UserId::new()).await.unwrap();
    queue.drain().await.unwrap();
    queue.require_active(token.id).await.unwrap();

    let seat_id = SeatId::new();
    repository.add_seat(seat_id).await;
    let reservation = coordinator.hold(seat_id, token.user_id).await.unwrap();
    coordinator.confirm(reservation.id).await.unwrap();
    queue.complete(token.id).await.unwrap();

    assert_eq!(
        repository.seat_state(seat_id).await.unwrap(),
        Some(SeatState::Confirmed)
    );
    assert_eq!(queue.active_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_scheduler_starts_and_shuts_down() {
    let config = AppConfig::load("development").expect("config should load");

    let store = StoreManager::new(&config.store).await.unwrap();
    let lock = DistributedLock::new(store.clone());
    let queue = AdmissionQueue::new(store, lock.clone(), config.queue.clone());
    let coordinator = ReservationCoordinator::new(
        Arc::new(InMemorySeatRepository::new()),
        lock,
        config.booking.clone(),
    );
    let reaper = Arc::new(ExpiryReaper::new(queue, coordinator));

    let mut scheduler = CronScheduler::new(reaper, config.worker.clone())
        .await
        .expect("scheduler should build");
    scheduler.register_default_tasks().await.unwrap();
    scheduler.start().await.unwrap();
    scheduler.shutdown().await.unwrap();
}
