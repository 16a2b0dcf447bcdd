// Monitor cadence: how soon the next temperature check should run

use super::constants::{
    COARSE_MAX_MINUTES, COARSE_MIN_MINUTES, MEDIUM_DELTA_F, MEDIUM_INTERVAL, PRECISION_DELTA_F,
    PRECISION_INTERVAL,
};
use super::estimator::DurationEstimator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Monitoring band, tightest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceMode {
    Precision,
    Medium,
    Coarse,
}

impl std::fmt::Display for CadenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CadenceMode::Precision => write!(f, "precision"),
            CadenceMode::Medium => write!(f, "medium"),
            CadenceMode::Coarse => write!(f, "coarse"),
        }
    }
}

/// Planned next check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckPlan {
    pub mode: CadenceMode,
    pub interval: Duration,
    pub next_check_at: i64, // epoch ms
}

/// Chooses the next check interval from the remaining temperature delta
#[derive(Debug, Clone, Copy)]
pub struct CadencePlanner {
    estimator: DurationEstimator,
}

impl CadencePlanner {
    pub fn new(estimator: DurationEstimator) -> Self {
        Self { estimator }
    }

    /// Plan the next check relative to `base_time`.
    ///
    /// Boundary deltas (exactly 2.0 and 5.0) fall into the tighter band.
    pub fn plan(
        &self,
        current: f64,
        target: f64,
        base_time: i64,
        precision_override: bool,
    ) -> CheckPlan {
        let delta = (target - current).abs();

        let (mode, interval) = if precision_override || delta <= PRECISION_DELTA_F {
            (CadenceMode::Precision, PRECISION_INTERVAL)
        } else if delta <= MEDIUM_DELTA_F {
            (CadenceMode::Medium, MEDIUM_INTERVAL)
        } else {
            (CadenceMode::Coarse, self.coarse_interval(current, target))
        };

        CheckPlan {
            mode,
            interval,
            next_check_at: base_time.saturating_add(interval.as_millis() as i64),
        }
    }

    // floor(estimate * 0.3) clamped to [5, 15] minutes. Above-target readings
    // estimate 0 and land on the lower bound.
    fn coarse_interval(&self, current: f64, target: f64) -> Duration {
        let estimate = self.estimator.estimate_minutes(current, target);
        let minutes =
            (estimate.saturating_mul(3) / 10).clamp(COARSE_MIN_MINUTES, COARSE_MAX_MINUTES);
        Duration::from_secs(minutes * 60)
    }
}
