// Transaction port for atomic operations

use super::event_store::EventFilter;
use crate::domain::HeatingEvent;
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Transactional EventStore operations
#[async_trait]
pub trait TransactionalEventStore: Send + Sync {
    /// Begin a new transaction.
    ///
    /// Implementations take the store's write lock up front so that two
    /// check-then-insert sequences can never interleave.
    async fn begin_transaction(&self) -> Result<Box<dyn EventStoreTransaction>>;
}

/// EventStore operations within a transaction
#[async_trait]
pub trait EventStoreTransaction: Transaction {
    /// Query events (within transaction)
    async fn query(&mut self, filter: &EventFilter) -> Result<Vec<HeatingEvent>>;

    /// Insert event (within transaction)
    async fn insert(&mut self, event: &HeatingEvent) -> Result<()>;
}
