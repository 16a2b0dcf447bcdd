// Event Store Port (Interface)

use crate::domain::{EventStatus, EventType, HeatingEvent};
use crate::error::Result;
use async_trait::async_trait;

/// Conjunctive filter over stored events. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Match any of these statuses (empty = any)
    pub statuses: Vec<EventStatus>,
    pub event_type: Option<EventType>,
    pub cycle_id: Option<String>,
    /// Only events whose `finished_at` is strictly before this instant (epoch ms)
    pub finished_before: Option<i64>,
    pub limit: Option<i64>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every non-terminal event
    pub fn scheduled() -> Self {
        Self::new().with_status(EventStatus::Scheduled)
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn for_cycle(mut self, cycle_id: impl Into<String>) -> Self {
        self.cycle_id = Some(cycle_id.into());
        self
    }

    pub fn finished_before(mut self, millis: i64) -> Self {
        self.finished_before = Some(millis);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// In-process evaluation (used by in-memory stores and as the reference
    /// semantics for SQL adapters)
    pub fn matches(&self, event: &HeatingEvent) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&event.status()) {
            return false;
        }
        if self.event_type.is_some_and(|t| t != event.event_type()) {
            return false;
        }
        if let Some(cycle_id) = &self.cycle_id {
            if event.cycle_id() != Some(cycle_id.as_str()) {
                return false;
            }
        }
        if let Some(before) = self.finished_before {
            match event.finished_at() {
                Some(finished) if finished < before => {}
                _ => return false,
            }
        }
        true
    }
}

/// Repository interface for HeatingEvent persistence.
///
/// Every stored record carries a version stamp. `update` succeeds only when
/// the caller's copy still has the stored version.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new event (Conflict if the id already exists)
    async fn insert(&self, event: &HeatingEvent) -> Result<()>;

    /// Find event by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<HeatingEvent>>;

    /// Persist a transitioned event.
    ///
    /// Uses `event.version()` as the expected stored version and returns the
    /// new version. Fails with `StaleVersion` if the record changed since it
    /// was read, `NotFound` if it no longer exists.
    async fn update(&self, event: &HeatingEvent) -> Result<i64>;

    /// Events matching the filter, ordered by `scheduled_for` then id
    async fn query(&self, filter: &EventFilter) -> Result<Vec<HeatingEvent>>;

    /// Physically delete events (retention sweep only). Returns rows removed.
    async fn delete(&self, ids: &[String]) -> Result<u64>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use crate::port::transaction::{EventStoreTransaction, Transaction, TransactionalEventStore};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    type Events = Arc<Mutex<BTreeMap<String, HeatingEvent>>>;

    /// In-memory event store with the same version semantics as the SQLite adapter
    #[derive(Clone, Default)]
    pub struct InMemoryEventStore {
        events: Events,
        write_lock: Arc<tokio::sync::Mutex<()>>,
        fail_writes: Arc<AtomicBool>,
    }

    impl InMemoryEventStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent insert/update fail with a Store error
        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn len(&self) -> usize {
            self.events.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Seed a record directly, bypassing validation (e.g. an already-past event)
        pub fn seed(&self, event: HeatingEvent) {
            self.events
                .lock()
                .unwrap()
                .insert(event.id().to_string(), event);
        }

        fn check_writable(&self) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Store("injected write failure".to_string()));
            }
            Ok(())
        }

        fn insert_into(events: &Events, event: &HeatingEvent) -> Result<()> {
            let mut events = events.lock().unwrap();
            if events.contains_key(event.id()) {
                return Err(AppError::Conflict(format!(
                    "event {} already exists",
                    event.id()
                )));
            }
            events.insert(event.id().to_string(), event.clone());
            Ok(())
        }

        fn query_from(events: &Events, filter: &EventFilter) -> Vec<HeatingEvent> {
            let events = events.lock().unwrap();
            let mut matched: Vec<HeatingEvent> = events
                .values()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect();
            matched.sort_by(|a, b| {
                a.scheduled_for()
                    .cmp(&b.scheduled_for())
                    .then_with(|| a.id().cmp(b.id()))
            });
            if let Some(limit) = filter.limit {
                matched.truncate(limit.max(0) as usize);
            }
            matched
        }
    }

    #[async_trait]
    impl EventStore for InMemoryEventStore {
        async fn insert(&self, event: &HeatingEvent) -> Result<()> {
            self.check_writable()?;
            Self::insert_into(&self.events, event)
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<HeatingEvent>> {
            Ok(self.events.lock().unwrap().get(id).cloned())
        }

        async fn update(&self, event: &HeatingEvent) -> Result<i64> {
            self.check_writable()?;
            let mut events = self.events.lock().unwrap();
            let stored = events
                .get(event.id())
                .ok_or_else(|| AppError::NotFound(format!("event {}", event.id())))?;

            if stored.version() != event.version() {
                return Err(AppError::StaleVersion {
                    id: event.id().to_string(),
                    expected: event.version(),
                });
            }

            let mut next = event.clone();
            let version = event.version() + 1;
            next.record_version(version);
            events.insert(event.id().to_string(), next);
            Ok(version)
        }

        async fn query(&self, filter: &EventFilter) -> Result<Vec<HeatingEvent>> {
            Ok(Self::query_from(&self.events, filter))
        }

        async fn delete(&self, ids: &[String]) -> Result<u64> {
            let mut events = self.events.lock().unwrap();
            Ok(ids.iter().filter(|id| events.remove(*id).is_some()).count() as u64)
        }
    }

    /// Transaction holding the store-wide write lock until commit/rollback
    pub struct InMemoryTransaction {
        events: Events,
        pending: Vec<HeatingEvent>,
        fail_writes: bool,
        _guard: tokio::sync::OwnedMutexGuard<()>,
    }

    #[async_trait]
    impl TransactionalEventStore for InMemoryEventStore {
        async fn begin_transaction(&self) -> Result<Box<dyn EventStoreTransaction>> {
            let guard = self.write_lock.clone().lock_owned().await;
            Ok(Box::new(InMemoryTransaction {
                events: self.events.clone(),
                pending: Vec::new(),
                fail_writes: self.fail_writes.load(Ordering::SeqCst),
                _guard: guard,
            }))
        }
    }

    #[async_trait]
    impl Transaction for InMemoryTransaction {
        async fn commit(self: Box<Self>) -> Result<()> {
            for event in &self.pending {
                InMemoryEventStore::insert_into(&self.events, event)?;
            }
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl EventStoreTransaction for InMemoryTransaction {
        async fn query(&mut self, filter: &EventFilter) -> Result<Vec<HeatingEvent>> {
            let mut matched = InMemoryEventStore::query_from(&self.events, filter);
            matched.extend(self.pending.iter().filter(|e| filter.matches(e)).cloned());
            Ok(matched)
        }

        async fn insert(&mut self, event: &HeatingEvent) -> Result<()> {
            if self.fail_writes {
                return Err(AppError::Store("injected write failure".to_string()));
            }
            self.pending.push(event.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::InMemoryEventStore;
    use super::*;
    use crate::error::AppError;

    const NOW: i64 = 1_700_000_000_000;

    #[tokio::test]
    async fn test_update_bumps_version_and_detects_stale_copy() {
        let store = InMemoryEventStore::new();
        let event = HeatingEvent::new_start("evt-1", NOW, 100.0, NOW);
        store.insert(&event).await.unwrap();

        let mut first = store.find_by_id("evt-1").await.unwrap().unwrap();
        let mut second = first.clone();

        assert!(first.cancel(NOW));
        assert_eq!(store.update(&first).await.unwrap(), 1);

        assert!(second.trigger(NOW));
        let err = store.update(&second).await.unwrap_err();
        assert!(matches!(err, AppError::StaleVersion { expected: 0, .. }));

        let stored = store.find_by_id("evt-1").await.unwrap().unwrap();
        assert_eq!(stored.status(), EventStatus::Cancelled);
        assert_eq!(stored.version(), 1);
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = InMemoryEventStore::new();
        let start = HeatingEvent::new_start("evt-1", NOW, 100.0, NOW);
        let late = HeatingEvent::new_monitor("mon-2", "evt-1", NOW + 2_000, 100.0, NOW);
        let early = HeatingEvent::new_monitor("mon-1", "evt-1", NOW + 1_000, 100.0, NOW);
        let other = HeatingEvent::new_monitor("mon-x", "evt-9", NOW + 500, 100.0, NOW);
        for e in [&start, &late, &early, &other] {
            store.insert(e).await.unwrap();
        }

        let monitors = store
            .query(
                &EventFilter::scheduled()
                    .with_type(EventType::Monitor)
                    .for_cycle("evt-1"),
            )
            .await
            .unwrap();
        let ids: Vec<_> = monitors.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["mon-1", "mon-2"]);

        let all = store.query(&EventFilter::new().limit(2)).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = InMemoryEventStore::new();
        let event = HeatingEvent::new_start("evt-1", NOW, 100.0, NOW);
        store.insert(&event).await.unwrap();
        assert!(matches!(
            store.insert(&event).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_finished_before_requires_finished_at() {
        let mut event = HeatingEvent::new_start("evt-1", NOW, 100.0, NOW);
        let filter = EventFilter::new().finished_before(NOW + 10);
        assert!(!filter.matches(&event));
        event.cancel(NOW);
        assert!(filter.matches(&event));
        assert!(!EventFilter::new().finished_before(NOW).matches(&event));
    }
}
