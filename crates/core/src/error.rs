// Central Error Type for the Application

use crate::domain::DomainError;
use crate::port::TriggerError;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Optimistic version check failed; the record changed since it was read
    #[error("Stale version for {id}: expected {expected}")]
    StaleVersion { id: String, expected: i64 },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for every rejection caused by bad caller input
    /// (identifier format, temperature range, past schedule, missing cycle id).
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            AppError::InvalidArgument(_) => true,
            AppError::Domain(e) => e.is_validation(),
            _ => false,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
