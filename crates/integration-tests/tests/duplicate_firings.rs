//! Duplicate deliveries of the same trigger, each in its own invocation
//! (separate connection pools against one SQLite file)

mod common;

use common::{Stack, NOW};
use futures::future::join_all;
use hottub_core::application::FiringOutcome;
use hottub_core::domain::EventType;
use hottub_core::error::AppError;
use hottub_core::port::{EventFilter, EventStore};

const DUPLICATES: usize = 4;

#[tokio::test]
async fn test_concurrent_schedules_admit_one_cycle() {
    let stack = Stack::new().await;
    let mut coordinators = Vec::new();
    for _ in 0..DUPLICATES {
        coordinators.push(stack.coordinator().await);
    }

    let results = join_all(
        coordinators
            .iter()
            .map(|c| c.schedule_cycle(NOW + 60_000, 101.0)),
    )
    .await;

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();
    assert_eq!(admitted, 1, "{:?}", results);
    assert_eq!(conflicts, DUPLICATES - 1);

    let store = stack.store().await;
    assert_eq!(store.query(&EventFilter::scheduled()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_monitor_firings_create_one_successor() {
    let stack = Stack::new().await;
    let setup = stack.coordinator().await;

    let cycle_id = setup.schedule_cycle(NOW, 102.0).await.unwrap();
    let FiringOutcome::MonitorScheduled(first) =
        setup.on_start_fired(&cycle_id, 90.0).await.unwrap()
    else {
        panic!("expected a monitor to be scheduled");
    };
    stack.clock.set(first.scheduled_for());

    let mut coordinators = Vec::new();
    for _ in 0..DUPLICATES {
        coordinators.push(stack.coordinator().await);
    }

    let outcomes = join_all(
        coordinators
            .iter()
            .map(|c| c.on_monitor_fired(&cycle_id, first.id(), 96.0)),
    )
    .await;

    let scheduled = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(FiringOutcome::MonitorScheduled(_))))
        .count();
    let absorbed = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(FiringOutcome::Absorbed)))
        .count();
    assert_eq!(scheduled, 1, "{:?}", outcomes);
    assert_eq!(absorbed, DUPLICATES - 1);

    let store = stack.store().await;
    let pending = store
        .query(
            &EventFilter::scheduled()
                .with_type(EventType::Monitor)
                .for_cycle(cycle_id.as_str()),
        )
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_ne!(pending[0].id(), first.id());
}

#[tokio::test]
async fn test_duplicate_start_firings_are_absorbed() {
    let stack = Stack::new().await;
    let setup = stack.coordinator().await;
    let cycle_id = setup.schedule_cycle(NOW, 102.0).await.unwrap();

    let mut coordinators = Vec::new();
    for _ in 0..DUPLICATES {
        coordinators.push(stack.coordinator().await);
    }

    let outcomes = join_all(
        coordinators
            .iter()
            .map(|c| c.on_start_fired(&cycle_id, 85.0)),
    )
    .await;

    let scheduled = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(FiringOutcome::MonitorScheduled(_))))
        .count();
    assert_eq!(scheduled, 1, "{:?}", outcomes);
    assert!(outcomes.iter().all(|o| o.is_ok()));

    let events = setup.cycle_events(&cycle_id).await.unwrap();
    assert_eq!(events.len(), 2);
}
