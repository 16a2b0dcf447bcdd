// Heating Event Domain Model

use super::error::{DomainError, Result};
use super::job_spec::{JobTag, TagNamespace};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event ID (also the externally visible job tag suffix)
pub type EventId = String;

/// Cycle ID (the START event's own id)
pub type CycleId = String;

/// Auxiliary key/value pairs (origin, sequence, retry counters)
pub type EventMetadata = BTreeMap<String, serde_json::Value>;

/// Hard ceiling for any persisted event target (°F)
pub const MAX_EVENT_TEMP_F: f64 = 110.0;

/// Which job template an event drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Start,
    Monitor,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Start => write!(f, "START"),
            EventType::Monitor => write!(f, "MONITOR"),
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "START" => Ok(EventType::Start),
            "MONITOR" => Ok(EventType::Monitor),
            other => Err(DomainError::ValidationError(format!(
                "unknown event type: {other}"
            ))),
        }
    }
}

/// Event status. SCHEDULED is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Scheduled,
    Triggered,
    Cancelled,
    Error,
}

impl EventStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EventStatus::Scheduled)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Scheduled => write!(f, "SCHEDULED"),
            EventStatus::Triggered => write!(f, "TRIGGERED"),
            EventStatus::Cancelled => write!(f, "CANCELLED"),
            EventStatus::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SCHEDULED" => Ok(EventStatus::Scheduled),
            "TRIGGERED" => Ok(EventStatus::Triggered),
            "CANCELLED" => Ok(EventStatus::Cancelled),
            "ERROR" => Ok(EventStatus::Error),
            other => Err(DomainError::ValidationError(format!(
                "unknown event status: {other}"
            ))),
        }
    }
}

/// Flat persisted form of a [`HeatingEvent`], used by store adapters to
/// rehydrate records without going through creation-time validation.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub id: EventId,
    pub scheduled_for: i64,
    pub event_type: EventType,
    pub target_temp: f64,
    pub status: EventStatus,
    pub cron_expression: String,
    pub cycle_id: Option<CycleId>,
    pub metadata: EventMetadata,
    pub created_at: i64,
    pub finished_at: Option<i64>,
    pub version: i64,
}

/// One scheduled phase transition of a heating cycle.
///
/// Fields are private: status only changes through [`cancel`](Self::cancel),
/// [`trigger`](Self::trigger) and [`mark_error`](Self::mark_error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatingEvent {
    id: EventId,
    scheduled_for: i64, // epoch ms
    event_type: EventType,
    target_temp: f64,
    status: EventStatus,
    cron_expression: String,
    cycle_id: Option<CycleId>,
    metadata: EventMetadata,
    created_at: i64,
    finished_at: Option<i64>,
    version: i64,
}

impl HeatingEvent {
    /// Create a START event. The event's own id becomes the cycle id.
    pub fn new_start(
        id: impl Into<String>,
        scheduled_for: i64,
        target_temp: f64,
        created_at: i64,
    ) -> Self {
        let id = id.into();
        let cycle_id = Some(id.clone());
        Self::new(
            id,
            EventType::Start,
            cycle_id,
            scheduled_for,
            target_temp,
            created_at,
        )
    }

    /// Create a MONITOR event belonging to `cycle_id`
    pub fn new_monitor(
        id: impl Into<String>,
        cycle_id: impl Into<String>,
        scheduled_for: i64,
        target_temp: f64,
        created_at: i64,
    ) -> Self {
        Self::new(
            id.into(),
            EventType::Monitor,
            Some(cycle_id.into()),
            scheduled_for,
            target_temp,
            created_at,
        )
    }

    fn new(
        id: EventId,
        event_type: EventType,
        cycle_id: Option<CycleId>,
        scheduled_for: i64,
        target_temp: f64,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            scheduled_for,
            event_type,
            target_temp,
            status: EventStatus::Scheduled,
            cron_expression: cron_expression_for(scheduled_for),
            cycle_id,
            metadata: EventMetadata::new(),
            created_at,
            finished_at: None,
            version: 0,
        }
    }

    /// Rehydrate from storage (exempt from the "not in the past" rule)
    pub fn restore(record: EventRecord) -> Self {
        Self {
            id: record.id,
            scheduled_for: record.scheduled_for,
            event_type: record.event_type,
            target_temp: record.target_temp,
            status: record.status,
            cron_expression: record.cron_expression,
            cycle_id: record.cycle_id,
            metadata: record.metadata,
            created_at: record.created_at,
            finished_at: record.finished_at,
            version: record.version,
        }
    }

    /// Attach an auxiliary metadata entry (builder style, before persistence)
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Attach metadata to a loaded event; persisted by the next update
    pub fn annotate(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Validate creation-time rules. Must pass before the event is persisted.
    pub fn validate(&self, now_millis: i64) -> Result<()> {
        if !self.target_temp.is_finite()
            || self.target_temp <= 0.0
            || self.target_temp > MAX_EVENT_TEMP_F
        {
            return Err(DomainError::TemperatureOutOfRange {
                value: self.target_temp,
                min: 0.0,
                max: MAX_EVENT_TEMP_F,
            });
        }

        if self.scheduled_for < now_millis {
            return Err(DomainError::ScheduledInPast {
                event_id: self.id.clone(),
                scheduled_for: self.scheduled_for,
                now: now_millis,
            });
        }

        if self.event_type == EventType::Monitor
            && self.cycle_id.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(DomainError::MissingCycleId(self.id.clone()));
        }

        Ok(())
    }

    /// SCHEDULED -> CANCELLED. Returns false (no-op) if already terminal.
    pub fn cancel(&mut self, now_millis: i64) -> bool {
        self.finish(EventStatus::Cancelled, now_millis)
    }

    /// SCHEDULED -> TRIGGERED. Returns false (no-op) if already terminal.
    pub fn trigger(&mut self, now_millis: i64) -> bool {
        self.finish(EventStatus::Triggered, now_millis)
    }

    /// SCHEDULED -> ERROR. Returns false (no-op) if already terminal.
    pub fn mark_error(&mut self, now_millis: i64) -> bool {
        self.finish(EventStatus::Error, now_millis)
    }

    fn finish(&mut self, to: EventStatus, now_millis: i64) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = to;
        self.finished_at = Some(now_millis);
        true
    }

    /// True only while SCHEDULED and the fire time has arrived
    pub fn is_past_due(&self, now_millis: i64) -> bool {
        self.status == EventStatus::Scheduled && self.scheduled_for <= now_millis
    }

    /// Record the version assigned by the store after a successful write
    pub fn record_version(&mut self, version: i64) {
        self.version = version;
    }

    /// Trigger-registry tag for this event
    pub fn tag(&self) -> JobTag {
        let namespace = match self.event_type {
            EventType::Start => TagNamespace::Start,
            EventType::Monitor => TagNamespace::Monitor,
        };
        JobTag::new(namespace, &self.id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scheduled_for(&self) -> i64 {
        self.scheduled_for
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn target_temp(&self) -> f64 {
        self.target_temp
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn cron_expression(&self) -> &str {
        &self.cron_expression
    }

    pub fn cycle_id(&self) -> Option<&str> {
        self.cycle_id.as_deref()
    }

    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<i64> {
        self.finished_at
    }

    pub fn version(&self) -> i64 {
        self.version
    }
}

/// Render a UTC 6-field cron expression (`sec min hour day month *`).
///
/// Informational only; the trigger registry is keyed by tag and fire time.
pub fn cron_expression_for(epoch_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_millis)
        .map(|t| {
            format!(
                "{} {} {} {} {} *",
                t.second(),
                t.minute(),
                t.hour(),
                t.day(),
                t.month()
            )
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;
    const HOUR_MS: i64 = 3_600_000;

    fn start_event() -> HeatingEvent {
        HeatingEvent::new_start("evt-start-1", NOW + HOUR_MS, 102.0, NOW)
    }

    #[test]
    fn test_new_start_owns_cycle() {
        let event = start_event();
        assert_eq!(event.status(), EventStatus::Scheduled);
        assert_eq!(event.cycle_id(), Some("evt-start-1"));
        assert_eq!(event.event_type(), EventType::Start);
        assert_eq!(event.version(), 0);
        assert!(event.finished_at().is_none());
    }

    #[test]
    fn test_cancel_and_trigger_are_idempotent() {
        let mut event = start_event();
        assert!(event.cancel(NOW));
        assert!(!event.cancel(NOW + 1));
        assert!(!event.trigger(NOW + 2));
        assert_eq!(event.status(), EventStatus::Cancelled);
        assert_eq!(event.finished_at(), Some(NOW));

        let mut event = start_event();
        assert!(event.trigger(NOW));
        assert!(!event.trigger(NOW + 1));
        assert!(!event.cancel(NOW + 2));
        assert!(!event.mark_error(NOW + 3));
        assert_eq!(event.status(), EventStatus::Triggered);
    }

    #[test]
    fn test_mark_error_is_terminal() {
        let mut event = start_event();
        assert!(event.mark_error(NOW));
        assert!(!event.cancel(NOW));
        assert_eq!(event.status(), EventStatus::Error);
    }

    #[test]
    fn test_validate_temperature_bounds() {
        let zero = HeatingEvent::new_start("evt-zero", NOW + HOUR_MS, 0.0, NOW);
        assert!(matches!(
            zero.validate(NOW),
            Err(DomainError::TemperatureOutOfRange { .. })
        ));

        let hot = HeatingEvent::new_start("evt-hot", NOW + HOUR_MS, 115.0, NOW);
        assert!(matches!(
            hot.validate(NOW),
            Err(DomainError::TemperatureOutOfRange { .. })
        ));

        let ceiling = HeatingEvent::new_start("evt-ceiling", NOW + HOUR_MS, 110.0, NOW);
        assert!(ceiling.validate(NOW).is_ok());
    }

    #[test]
    fn test_validate_rejects_past_schedule() {
        let past = HeatingEvent::new_start("evt-past", NOW - HOUR_MS, 100.0, NOW);
        assert!(matches!(
            past.validate(NOW),
            Err(DomainError::ScheduledInPast { .. })
        ));
    }

    #[test]
    fn test_validate_monitor_requires_cycle() {
        let monitor = HeatingEvent::new_monitor("mon-1", "", NOW + 1000, 100.0, NOW);
        assert!(matches!(
            monitor.validate(NOW),
            Err(DomainError::MissingCycleId(_))
        ));

        let monitor = HeatingEvent::new_monitor("mon-2", "cycle-1", NOW + 1000, 100.0, NOW);
        assert!(monitor.validate(NOW).is_ok());
    }

    #[test]
    fn test_restore_skips_past_check() {
        let restored = HeatingEvent::restore(EventRecord {
            id: "evt-old".to_string(),
            scheduled_for: NOW - HOUR_MS,
            event_type: EventType::Start,
            target_temp: 100.0,
            status: EventStatus::Scheduled,
            cron_expression: String::new(),
            cycle_id: Some("evt-old".to_string()),
            metadata: EventMetadata::new(),
            created_at: NOW - 2 * HOUR_MS,
            finished_at: None,
            version: 4,
        });
        assert_eq!(restored.version(), 4);
        assert!(restored.is_past_due(NOW));
    }

    #[test]
    fn test_is_past_due_only_when_scheduled() {
        let mut event = HeatingEvent::new_start("evt-due", NOW, 100.0, NOW);
        assert!(event.is_past_due(NOW));
        assert!(!event.is_past_due(NOW - 1));
        event.trigger(NOW);
        assert!(!event.is_past_due(NOW + HOUR_MS));
    }

    #[test]
    fn test_tag_namespace_follows_type() {
        assert_eq!(start_event().tag().as_str(), "HOT_TUB_START:evt-start-1");
        let monitor = HeatingEvent::new_monitor("mon-9", "cycle-1", NOW, 100.0, NOW);
        assert_eq!(monitor.tag().as_str(), "HOT_TUB_MONITOR:mon-9");
    }

    #[test]
    fn test_cron_expression_rendering() {
        // 2023-11-14T22:13:20Z
        assert_eq!(cron_expression_for(NOW), "20 13 22 14 11 *");
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            EventStatus::Scheduled,
            EventStatus::Triggered,
            EventStatus::Cancelled,
            EventStatus::Error,
        ] {
            let parsed: EventStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("PAUSED".parse::<EventStatus>().is_err());
    }
}
