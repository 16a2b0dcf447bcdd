// Port Layer - Interfaces for external dependencies

pub mod artifact_store;
pub mod event_store;
pub mod id_provider; // For deterministic testing
pub mod secret_store;
pub mod time_provider;
pub mod transaction;
pub mod trigger;

// Re-exports
pub use artifact_store::JobArtifactStore;
pub use event_store::{EventFilter, EventStore};
pub use id_provider::IdProvider;
pub use secret_store::SecretStore;
pub use time_provider::TimeProvider;
pub use transaction::{EventStoreTransaction, Transaction, TransactionalEventStore};
pub use trigger::{TriggerError, TriggerRegistration, TriggerRegistry, TriggerTransport};
