// Application constants (no magic values)
use std::time::Duration;

/// Precision-mode monitor interval (15s), used within 2°F of target
pub const PRECISION_INTERVAL: Duration = Duration::from_secs(15);

/// Medium-mode monitor interval (2 minutes)
pub const MEDIUM_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Delta (°F) at or below which precision mode applies
pub const PRECISION_DELTA_F: f64 = 2.0;

/// Delta (°F) at or below which medium mode applies
pub const MEDIUM_DELTA_F: f64 = 5.0;

/// Coarse-mode interval bounds (minutes)
pub const COARSE_MIN_MINUTES: u64 = 5;
pub const COARSE_MAX_MINUTES: u64 = 15;

/// Minimum safety buffer added to every heating estimate (minutes)
pub const MIN_BUFFER_MINUTES: u64 = 5;

/// Attempts for one optimistic read-modify-write transition
pub const TRANSITION_ATTEMPTS: u32 = 3;

/// Reason attached to stop jobs issued when the target is reached
pub const TARGET_REACHED_REASON: &str = "target temperature reached";

/// Metadata keys written on events
pub const META_ORIGIN: &str = "origin";
pub const META_SEQUENCE: &str = "sequence";
pub const META_PREVIOUS_MONITOR: &str = "previous_monitor";
pub const META_CADENCE: &str = "cadence";
pub const META_STOPPED: &str = "stopped";
