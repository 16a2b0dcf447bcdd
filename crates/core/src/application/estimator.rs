// Duration estimate: minutes until the water reaches target, plus safety buffer

use super::constants::MIN_BUFFER_MINUTES;
use crate::error::{AppError, Result};

/// Pure time-to-target estimator for a configured heating rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationEstimator {
    heating_rate: f64, // °F per minute
}

impl DurationEstimator {
    /// Rate must be finite and positive
    pub fn new(heating_rate: f64) -> Result<Self> {
        if !heating_rate.is_finite() || heating_rate <= 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "heating rate must be a positive number of °F/min, got {}",
                heating_rate
            )));
        }
        Ok(Self { heating_rate })
    }

    pub fn heating_rate(&self) -> f64 {
        self.heating_rate
    }

    /// Estimated minutes to reach `target`, including the safety buffer.
    ///
    /// Returns 0 when already at or above target. Otherwise
    /// `ceil(delta / rate) + max(5, ceil(est * 10%))`.
    pub fn estimate_minutes(&self, current: f64, target: f64) -> u64 {
        // NaN inputs compare false here and fall through to the zero estimate
        if !(target > current) {
            return 0;
        }

        // Float-to-int casts saturate, so absurd deltas pin at u64::MAX
        let estimated = ((target - current) / self.heating_rate).ceil() as u64;
        // ceil(est * 0.10) in integers so the result is exact
        let buffer = estimated.div_ceil(10).max(MIN_BUFFER_MINUTES);
        estimated.saturating_add(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> DurationEstimator {
        DurationEstimator::new(0.5).unwrap()
    }

    #[test]
    fn test_at_or_above_target_is_zero() {
        let e = estimator();
        assert_eq!(e.estimate_minutes(102.0, 102.0), 0);
        assert_eq!(e.estimate_minutes(104.5, 102.0), 0);
        assert_eq!(e.estimate_minutes(110.0, 50.0), 0);
    }

    #[test]
    fn test_reference_fixture() {
        // 14°F at 0.5°F/min = 28 min, buffer max(5, 3) = 5
        assert_eq!(estimator().estimate_minutes(88.0, 102.0), 33);
    }

    #[test]
    fn test_buffer_scales_above_fifty_minutes() {
        // 60°F at 0.5 = 120 min, buffer 12
        assert_eq!(estimator().estimate_minutes(40.0, 100.0), 132);
        // 51 min -> ceil(5.1) = 6
        assert_eq!(estimator().estimate_minutes(74.5, 100.0), 57);
    }

    #[test]
    fn test_extreme_delta_saturates() {
        assert_eq!(estimator().estimate_minutes(-1.0e20, 102.0), u64::MAX);
        assert_eq!(estimator().estimate_minutes(f64::MIN, f64::MAX), u64::MAX);
    }

    #[test]
    fn test_partial_minutes_round_up() {
        // 0.2°F at 0.5 = 0.4 min -> 1, plus minimum buffer
        assert_eq!(estimator().estimate_minutes(99.8, 100.0), 6);
    }

    #[test]
    fn test_rejects_invalid_rate() {
        for rate in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let err = DurationEstimator::new(rate).unwrap_err();
            assert!(err.is_invalid_argument());
        }
    }
}
