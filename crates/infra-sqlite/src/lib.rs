// Hot Tub Infrastructure - SQLite Adapter
// Implements: EventStore, TransactionalEventStore

mod connection;
mod error;
mod event_store;
mod migration;
mod transaction;

pub use connection::create_pool;
pub use event_store::SqliteEventStore;
pub use migration::run_migrations;
pub use transaction::SqliteEventTransaction;
