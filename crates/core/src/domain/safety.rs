//! Safety bounds applied before anything is persisted or built.
//!
//! These are configuration-level constants, not per-request knobs.

use super::error::{DomainError, Result};

/// Lowest target temperature a job may request (°F)
pub const MIN_TARGET_TEMP_F: f64 = 50.0;

/// Highest target temperature a job may request (°F)
pub const MAX_TARGET_TEMP_F: f64 = 110.0;

/// Plausible water-sensor readings (°F); anything outside is a bad sensor
pub const MIN_READING_F: f64 = -40.0;
pub const MAX_READING_F: f64 = 250.0;

/// Identifier length bounds (inclusive)
pub const MIN_ID_LEN: usize = 3;
pub const MAX_ID_LEN: usize = 50;

/// Upper bound for free-text stop reasons
pub const MAX_REASON_LEN: usize = 200;

/// Validate an event/cycle/monitor identifier: `[A-Za-z0-9_-]{3,50}`
pub fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    let invalid = |reason: String| DomainError::InvalidIdentifier {
        field,
        value: value.to_string(),
        reason,
    };

    let len = value.chars().count();
    if !(MIN_ID_LEN..=MAX_ID_LEN).contains(&len) {
        return Err(invalid(format!(
            "length {} outside [{}, {}]",
            len, MIN_ID_LEN, MAX_ID_LEN
        )));
    }

    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(invalid(format!(
            "character {:?} not allowed (alphanumeric, '_' and '-' only)",
            bad
        )));
    }

    Ok(())
}

/// Validate a requested target temperature against the hard safety range
pub fn validate_target_temp(value: f64) -> Result<()> {
    if !value.is_finite() || !(MIN_TARGET_TEMP_F..=MAX_TARGET_TEMP_F).contains(&value) {
        return Err(DomainError::TemperatureOutOfRange {
            value,
            min: MIN_TARGET_TEMP_F,
            max: MAX_TARGET_TEMP_F,
        });
    }
    Ok(())
}

/// Validate a free-text stop reason
pub fn validate_reason(reason: &str) -> Result<()> {
    if reason.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "stop reason cannot be empty".to_string(),
        ));
    }
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(DomainError::ValidationError(format!(
            "stop reason too long (max {} characters)",
            MAX_REASON_LEN
        )));
    }
    if reason.chars().any(char::is_control) {
        return Err(DomainError::ValidationError(
            "stop reason contains control characters".to_string(),
        ));
    }
    Ok(())
}
