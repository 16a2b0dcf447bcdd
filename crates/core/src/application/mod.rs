// Application Layer - Use Cases and Business Logic

pub mod cadence;
pub mod constants;
pub mod coordinator;
pub mod dispatch;
pub mod estimator;
pub mod job_builder;
pub mod retry;

// Re-exports
pub use cadence::{CadenceMode, CadencePlanner, CheckPlan};
pub use coordinator::{CycleCoordinator, CyclePorts, EmergencyStopReport, FiringOutcome};
pub use dispatch::{FireReport, TriggerDispatcher};
pub use estimator::DurationEstimator;
pub use job_builder::JobSpecBuilder;
pub use retry::{RetryDecision, TriggerRetryPolicy};
