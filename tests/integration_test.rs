use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use stock_allocation::clock::{Clock, ManualClock};
use stock_allocation::config::AllocationConfig;
use stock_allocation::gateway::ReservationOutcome;
use stock_allocation::lifecycle::AllocationSystem;
use stock_allocation::model::{AllocationState, HolderId, ResourceId};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn start(clock: Arc<ManualClock>) -> AllocationSystem {
    AllocationSystem::with_clock(&AllocationConfig::default(), clock).unwrap()
}

/// Full end-to-end run: one slot, two users, the first user's claim lapses, a third
/// user takes the slot.
#[tokio::test]
async fn test_capacity_one_lifecycle() {
    let clock = Arc::new(ManualClock::new(t0()));
    let system = start(clock.clone());
    let repository = &system.repository;
    let stock = ResourceId::from("item-999");
    repository.create_stock(&stock, 1).await.unwrap();

    let a = HolderId::from("user-A");
    let b = HolderId::from("user-B");
    let c = HolderId::from("user-C");

    assert_eq!(
        repository.reserve(&stock, &a, t0()).await.unwrap(),
        ReservationOutcome::Granted
    );
    assert_eq!(
        repository
            .reserve(&stock, &b, t0() + Duration::seconds(1))
            .await
            .unwrap(),
        ReservationOutcome::OutOfCapacity
    );

    // Still inside the window.
    clock.set(t0() + Duration::seconds(30));
    let loaded = repository.load(&stock).await.unwrap();
    assert_eq!(loaded.active_count(), 1);
    assert!(!loaded.can_allocate());
    assert!(loaded.has_active_allocation(&a));

    // Past the window, nothing has been written yet.
    clock.set(t0() + Duration::seconds(601));
    let loaded = repository.load(&stock).await.unwrap();
    assert_eq!(loaded.allocations().len(), 1);
    assert_eq!(loaded.allocations()[0].state(), AllocationState::Expired);
    assert_eq!(loaded.active_count(), 0);
    assert!(loaded.can_allocate());

    assert_eq!(
        repository
            .reserve(&stock, &c, t0() + Duration::seconds(602))
            .await
            .unwrap(),
        ReservationOutcome::Granted
    );

    let loaded = repository
        .load_at(&stock, t0() + Duration::seconds(603))
        .await
        .unwrap();
    assert_eq!(loaded.active_count(), 1);
    assert!(loaded.has_active_allocation(&c));
    assert!(!loaded.has_active_allocation(&a));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reclaim_is_idempotent() {
    let clock = Arc::new(ManualClock::new(t0()));
    let system = start(clock);
    let repository = &system.repository;
    let stock = ResourceId::from("item-1");
    let a = HolderId::from("user-A");
    repository.create_stock(&stock, 3).await.unwrap();

    assert_eq!(
        repository.reserve(&stock, &a, t0()).await.unwrap(),
        ReservationOutcome::Granted
    );
    assert_eq!(
        repository
            .reserve(&stock, &a, t0() + Duration::seconds(5))
            .await
            .unwrap(),
        ReservationOutcome::AlreadyReserved
    );

    let loaded = repository.load(&stock).await.unwrap();
    assert_eq!(loaded.active_count(), 1);
    assert_eq!(loaded.version(), 2);
    assert_eq!(loaded.active_allocation(&a).unwrap().reserved_at(), t0());

    system.shutdown().await.unwrap();
}

/// Many callers race for a small stock; at most `total` distinct holders win.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_respect_capacity() {
    let clock = Arc::new(ManualClock::new(t0()));
    let system = start(clock);
    let stock = ResourceId::from("item-hot");
    system.repository.create_stock(&stock, 5).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..50 {
        let repository = system.repository.clone();
        let stock = stock.clone();
        tasks.push(tokio::spawn(async move {
            let holder = HolderId::from(format!("user-{i}"));
            let outcome = repository.reserve(&stock, &holder, t0()).await.unwrap();
            (holder, outcome)
        }));
    }

    let mut winners = HashSet::new();
    for task in tasks {
        let (holder, outcome) = task.await.unwrap();
        match outcome {
            ReservationOutcome::Granted => {
                winners.insert(holder);
            }
            ReservationOutcome::OutOfCapacity => {}
            ReservationOutcome::AlreadyReserved => panic!("distinct holders never collide"),
        }
    }
    assert_eq!(winners.len(), 5);

    let loaded = system.repository.load(&stock).await.unwrap();
    assert_eq!(loaded.active_count(), 5);
    for holder in &winners {
        assert!(loaded.has_active_allocation(holder));
    }

    system.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_holder_racing_itself_is_granted_once() {
    let clock = Arc::new(ManualClock::new(t0()));
    let system = start(clock);
    let stock = ResourceId::from("item-2");
    system.repository.create_stock(&stock, 3).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let repository = system.repository.clone();
        let stock = stock.clone();
        tasks.push(tokio::spawn(async move {
            repository
                .reserve(&stock, &"user-A".into(), t0())
                .await
                .unwrap()
        }));
    }

    let mut granted = 0;
    for task in tasks {
        match task.await.unwrap() {
            ReservationOutcome::Granted => granted += 1,
            outcome => assert_eq!(outcome, ReservationOutcome::AlreadyReserved),
        }
    }
    assert_eq!(granted, 1);
    assert_eq!(system.repository.load(&stock).await.unwrap().active_count(), 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sweep_and_reclaim_after_expiry() {
    let clock = Arc::new(ManualClock::new(t0()));
    let system = start(clock.clone());
    let repository = &system.repository;
    let stock = ResourceId::from("item-3");
    let a = HolderId::from("user-A");
    repository.create_stock(&stock, 1).await.unwrap();
    repository.reserve(&stock, &a, t0()).await.unwrap();

    clock.advance(Duration::minutes(5));
    assert_eq!(repository.sweep_expired(&stock).await.unwrap(), 0);

    clock.advance(Duration::minutes(6));
    assert_eq!(repository.sweep_expired(&stock).await.unwrap(), 1);
    let loaded = repository.load(&stock).await.unwrap();
    assert!(loaded.allocations().is_empty());
    assert_eq!(loaded.version(), 3);

    // The same holder may claim again once its old claim has lapsed.
    assert_eq!(
        repository.reserve(&stock, &a, clock.now()).await.unwrap(),
        ReservationOutcome::Granted
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_stock_and_duplicate_creation() {
    let system = start(Arc::new(ManualClock::new(t0())));
    let repository = &system.repository;
    let stock = ResourceId::from("item-4");

    assert!(matches!(
        repository.load(&stock).await,
        Err(stock_allocation::repository::RepositoryError::NotFound(id)) if id == stock
    ));

    repository.create_stock(&stock, 2).await.unwrap();
    assert!(repository.create_stock(&stock, 2).await.is_err());

    system.shutdown().await.unwrap();
}
