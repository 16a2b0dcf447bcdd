// Domain Layer - Pure business logic and entities

pub mod error;
pub mod event;
pub mod job_spec;
pub mod safety;
pub mod secret;

// Re-exports
pub use error::DomainError;
pub use event::{
    CycleId, EventId, EventMetadata, EventRecord, EventStatus, EventType, HeatingEvent,
};
pub use job_spec::{JobKind, JobSpec, JobTag, TagNamespace, TAG_PREFIX};
pub use secret::{Secret, SecretRef};
