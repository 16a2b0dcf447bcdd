// SQLite Transaction Implementation

use crate::error::map_sqlx_error;
use crate::event_store::{insert_query, select_events, EventRow};
use async_trait::async_trait;
use hottub_core::domain::HeatingEvent;
use hottub_core::error::Result;
use hottub_core::port::{EventFilter, EventStoreTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

pub struct SqliteEventTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
}

impl SqliteEventTransaction {
    pub fn new(tx: SqlxTransaction<'static, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteEventTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl EventStoreTransaction for SqliteEventTransaction {
    async fn query(&mut self, filter: &EventFilter) -> Result<Vec<HeatingEvent>> {
        let rows: Vec<EventRow> = select_events(filter)
            .build_query_as()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(EventRow::into_event).collect()
    }

    async fn insert(&mut self, event: &HeatingEvent) -> Result<()> {
        insert_query(event)?
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
