// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidIdentifier {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Target temperature {value}°F outside safety range [{min}, {max}]")]
    TemperatureOutOfRange { value: f64, min: f64, max: f64 },

    #[error("Event {event_id} scheduled in the past ({scheduled_for} < {now})")]
    ScheduledInPast {
        event_id: String,
        scheduled_for: i64,
        now: i64,
    },

    #[error("Monitor event {0} has no cycle id")]
    MissingCycleId(String),

    #[error("Invalid secret format: {0}")]
    InvalidSecretFormat(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Whether this error is an input rejection (as opposed to a data-integrity problem)
    pub fn is_validation(&self) -> bool {
        !matches!(self, DomainError::InvalidSecretFormat(_))
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
