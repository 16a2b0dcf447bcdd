// SQLite EventStore Implementation

use crate::error::map_sqlx_error;
use crate::SqliteEventTransaction;
use async_trait::async_trait;
use hottub_core::domain::{
    DomainError, EventMetadata, EventRecord, EventStatus, EventType, HeatingEvent,
};
use hottub_core::error::{AppError, Result};
use hottub_core::port::{
    EventFilter, EventStore, EventStoreTransaction, TimeProvider, TransactionalEventStore,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;

pub struct SqliteEventStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteEventStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn insert(&self, event: &HeatingEvent) -> Result<()> {
        insert_query(event)?
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<HeatingEvent>> {
        let row = sqlx::query_as::<_, EventRow>("SELECT * FROM heating_events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(EventRow::into_event).transpose()
    }

    async fn update(&self, event: &HeatingEvent) -> Result<i64> {
        // Optimistic concurrency: only the holder of the current version may write
        let result = sqlx::query(
            r#"
            UPDATE heating_events
            SET status = ?, finished_at = ?, metadata = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(event.status().to_string())
        .bind(event.finished_at())
        .bind(serde_json::to_string(event.metadata())?)
        .bind(event.id())
        .bind(event.version())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 1 {
            return Ok(event.version() + 1);
        }

        // Distinguish a lost race from a missing record
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT version FROM heating_events WHERE id = ?")
                .bind(event.id())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        match exists {
            None => Err(AppError::NotFound(format!("Event {} not found", event.id()))),
            Some(_) => Err(AppError::StaleVersion {
                id: event.id().to_string(),
                expected: event.version(),
            }),
        }
    }

    async fn query(&self, filter: &EventFilter) -> Result<Vec<HeatingEvent>> {
        let rows: Vec<EventRow> = select_events(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(EventRow::into_event).collect()
    }

    async fn delete(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM heating_events WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TransactionalEventStore for SqliteEventStore {
    async fn begin_transaction(&self) -> Result<Box<dyn EventStoreTransaction>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Write first: takes the database write lock before any read, so a
        // concurrent scheduler waits (busy_timeout) instead of reading a
        // snapshot that is about to go stale
        sqlx::query("UPDATE store_lock SET touched_at = ? WHERE id = 1")
            .bind(self.time_provider.now_millis())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(Box::new(SqliteEventTransaction::new(tx)))
    }
}

/// INSERT statement for one event
pub(crate) fn insert_query(
    event: &HeatingEvent,
) -> Result<sqlx::query::Query<'static, Sqlite, sqlx::sqlite::SqliteArguments<'static>>> {
    let metadata = serde_json::to_string(event.metadata())?;

    Ok(sqlx::query(
        r#"
        INSERT INTO heating_events (
            id, event_type, status, scheduled_for, target_temp,
            cron_expression, cycle_id, metadata, created_at, finished_at, version
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(event.id().to_string())
    .bind(event.event_type().to_string())
    .bind(event.status().to_string())
    .bind(event.scheduled_for())
    .bind(event.target_temp())
    .bind(event.cron_expression().to_string())
    .bind(event.cycle_id().map(str::to_string))
    .bind(metadata)
    .bind(event.created_at())
    .bind(event.finished_at())
    .bind(event.version()))
}

/// SELECT for an `EventFilter`, ordered by scheduled time then id
pub(crate) fn select_events(filter: &EventFilter) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM heating_events WHERE 1 = 1");

    if !filter.statuses.is_empty() {
        builder.push(" AND status IN (");
        let mut separated = builder.separated(", ");
        for status in &filter.statuses {
            separated.push_bind(status.to_string());
        }
        separated.push_unseparated(")");
    }

    if let Some(event_type) = filter.event_type {
        builder
            .push(" AND event_type = ")
            .push_bind(event_type.to_string());
    }

    if let Some(cycle_id) = &filter.cycle_id {
        builder.push(" AND cycle_id = ").push_bind(cycle_id.clone());
    }

    if let Some(before) = filter.finished_before {
        builder
            .push(" AND finished_at IS NOT NULL AND finished_at < ")
            .push_bind(before);
    }

    builder.push(" ORDER BY scheduled_for ASC, id ASC");

    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }

    builder
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EventRow {
    id: String,
    event_type: String,
    status: String,
    scheduled_for: i64,
    target_temp: f64,
    cron_expression: String,
    cycle_id: Option<String>,
    metadata: String,
    created_at: i64,
    finished_at: Option<i64>,
    version: i64,
}

impl EventRow {
    pub(crate) fn into_event(self) -> Result<HeatingEvent> {
        let corrupt = |what: &str, detail: String| {
            AppError::Corrupt(format!("event {}: {} ({})", self.id, what, detail))
        };

        let event_type = self
            .event_type
            .parse::<EventType>()
            .map_err(|e: DomainError| corrupt("event_type", e.to_string()))?;
        let status = self
            .status
            .parse::<EventStatus>()
            .map_err(|e: DomainError| corrupt("status", e.to_string()))?;
        let metadata: EventMetadata = serde_json::from_str(&self.metadata)
            .map_err(|e| corrupt("metadata", e.to_string()))?;

        Ok(HeatingEvent::restore(EventRecord {
            id: self.id,
            scheduled_for: self.scheduled_for,
            event_type,
            target_temp: self.target_temp,
            status,
            cron_expression: self.cron_expression,
            cycle_id: self.cycle_id,
            metadata,
            created_at: self.created_at,
            finished_at: self.finished_at,
            version: self.version,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use hottub_core::port::time_provider::mocks::FixedTimeProvider;
    use hottub_core::port::Transaction;
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000_000;

    async fn setup_store() -> SqliteEventStore {
        let pool = create_pool("sqlite::memory:", Duration::from_secs(5))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteEventStore::new(pool, Arc::new(FixedTimeProvider::new(NOW)))
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let store = setup_store().await;
        let event = HeatingEvent::new_monitor("mon-1", "evt-1", NOW + 15_000, 101.5, NOW)
            .with_metadata("sequence", serde_json::json!(3));

        store.insert(&event).await.unwrap();

        let found = store.find_by_id("mon-1").await.unwrap().unwrap();
        assert_eq!(found, event);
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_conflict() {
        let store = setup_store().await;
        let event = HeatingEvent::new_start("evt-1", NOW, 100.0, NOW);
        store.insert(&event).await.unwrap();
        assert!(matches!(
            store.insert(&event).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_is_versioned() {
        let store = setup_store().await;
        store
            .insert(&HeatingEvent::new_start("evt-1", NOW, 100.0, NOW))
            .await
            .unwrap();

        let mut winner = store.find_by_id("evt-1").await.unwrap().unwrap();
        let mut loser = winner.clone();

        winner.trigger(NOW + 1);
        assert_eq!(store.update(&winner).await.unwrap(), 1);

        loser.cancel(NOW + 2);
        assert!(matches!(
            store.update(&loser).await,
            Err(AppError::StaleVersion { expected: 0, .. })
        ));

        let stored = store.find_by_id("evt-1").await.unwrap().unwrap();
        assert_eq!(stored.status(), EventStatus::Triggered);
        assert_eq!(stored.finished_at(), Some(NOW + 1));
        assert_eq!(stored.version(), 1);

        let ghost = HeatingEvent::new_start("ghost", NOW, 100.0, NOW);
        assert!(matches!(
            store.update(&ghost).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_query_filters() {
        let store = setup_store().await;
        let mut cancelled = HeatingEvent::new_start("evt-old", NOW - 10, 100.0, NOW - 20);
        cancelled.cancel(NOW - 5);
        for event in [
            cancelled,
            HeatingEvent::new_start("evt-1", NOW, 100.0, NOW),
            HeatingEvent::new_monitor("mon-2", "evt-1", NOW + 2_000, 100.0, NOW),
            HeatingEvent::new_monitor("mon-1", "evt-1", NOW + 1_000, 100.0, NOW),
        ] {
            store.insert(&event).await.unwrap();
        }

        let scheduled = store.query(&EventFilter::scheduled()).await.unwrap();
        let ids: Vec<_> = scheduled.iter().map(|e| e.id().to_string()).collect();
        assert_eq!(ids, vec!["evt-1", "mon-1", "mon-2"]);

        let monitors = store
            .query(
                &EventFilter::scheduled()
                    .with_type(EventType::Monitor)
                    .for_cycle("evt-1")
                    .limit(1),
            )
            .await
            .unwrap();
        assert_eq!(monitors.len(), 1);
        assert_eq!(monitors[0].id(), "mon-1");

        let finished = store
            .query(
                &EventFilter::new()
                    .with_status(EventStatus::Cancelled)
                    .with_status(EventStatus::Triggered)
                    .finished_before(NOW),
            )
            .await
            .unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].id(), "evt-old");
    }

    #[tokio::test]
    async fn test_delete() {
        let store = setup_store().await;
        store
            .insert(&HeatingEvent::new_start("evt-1", NOW, 100.0, NOW))
            .await
            .unwrap();

        assert_eq!(store.delete(&[]).await.unwrap(), 0);
        let removed = store
            .delete(&["evt-1".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.find_by_id("evt-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transaction_commit_and_rollback() {
        let store = setup_store().await;

        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert(&HeatingEvent::new_start("evt-1", NOW, 100.0, NOW))
            .await
            .unwrap();
        assert_eq!(tx.query(&EventFilter::scheduled()).await.unwrap().len(), 1);
        tx.rollback().await.unwrap();
        assert!(store.find_by_id("evt-1").await.unwrap().is_none());

        let mut tx = store.begin_transaction().await.unwrap();
        tx.insert(&HeatingEvent::new_start("evt-2", NOW, 100.0, NOW))
            .await
            .unwrap();
        tokio_test::assert_ok!(tx.commit().await);
        assert!(store.find_by_id("evt-2").await.unwrap().is_some());
    }
}
