// Engine configuration (tunable behavior of the core services)

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Heating rate in °F per minute used for duration estimates
    pub heating_rate: f64,

    /// Force precision-mode cadence for every monitor check
    pub precision_override: bool,

    /// Default retention for terminal events before the reaper removes them (hours)
    pub retention_hours: i64,

    /// Retries after the first failed trigger invocation
    pub trigger_max_retries: u32,

    /// Fixed delay between trigger retries (ms)
    pub trigger_retry_delay_ms: u64,

    /// Upper bound for a single event-store operation (ms)
    pub store_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heating_rate: 0.5,
            precision_override: false,
            retention_hours: 24,
            trigger_max_retries: 2,
            trigger_retry_delay_ms: 5_000,
            store_timeout_ms: 5_000,
        }
    }
}

impl EngineConfig {
    /// Reject values the services cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.heating_rate.is_finite() || self.heating_rate <= 0.0 {
            return Err(AppError::Config(format!(
                "heating_rate must be a positive number, got {}",
                self.heating_rate
            )));
        }
        if self.retention_hours < 0 {
            return Err(AppError::Config(format!(
                "retention_hours must not be negative, got {}",
                self.retention_hours
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(AppError::Config(
                "store_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.heating_rate, 0.5);
        assert_eq!(config.trigger_max_retries, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = EngineConfig {
                heating_rate: rate,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(AppError::Config(_))));
        }
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"heating_rate": 0.75}"#).unwrap();
        assert_eq!(config.heating_rate, 0.75);
        assert_eq!(config.retention_hours, 24);
    }
}
