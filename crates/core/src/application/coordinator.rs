// Cycle Coordinator - one active cycle, cancellation, monitor chaining, reaping
//
// Every operation is a short-lived, externally triggered invocation. State is
// re-read from the event store each time and every transition is a versioned
// read-modify-write, so duplicate firings of the same tick are absorbed.

use super::cadence::{CadencePlanner, CheckPlan};
use super::constants::{
    META_CADENCE, META_ORIGIN, META_PREVIOUS_MONITOR, META_SEQUENCE, META_STOPPED,
    TARGET_REACHED_REASON, TRANSITION_ATTEMPTS,
};
use super::dispatch::{FireReport, TriggerDispatcher};
use super::estimator::DurationEstimator;
use super::job_builder::JobSpecBuilder;
use crate::config::EngineConfig;
use crate::domain::safety::{
    validate_identifier, validate_target_temp, MAX_READING_F, MIN_READING_F,
};
use crate::domain::{
    CycleId, DomainError, EventStatus, EventType, HeatingEvent, JobKind, JobSpec, JobTag,
    TagNamespace,
};
use crate::error::{AppError, Result};
use crate::port::{
    EventFilter, EventStore, IdProvider, JobArtifactStore, SecretStore, TimeProvider,
    TransactionalEventStore, TriggerRegistry,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Everything the coordinator talks to
pub struct CyclePorts {
    pub store: Arc<dyn EventStore>,
    pub tx_store: Arc<dyn TransactionalEventStore>,
    pub secrets: Arc<dyn SecretStore>,
    pub artifacts: Arc<dyn JobArtifactStore>,
    pub registry: Arc<dyn TriggerRegistry>,
    pub id_provider: Arc<dyn IdProvider>,
    pub time_provider: Arc<dyn TimeProvider>,
}

/// Result of handling a START or MONITOR firing
#[derive(Debug, Clone)]
pub enum FiringOutcome {
    /// Duplicate or stale firing; nothing changed
    Absorbed,
    /// Still heating; the successor check is scheduled
    MonitorScheduled(HeatingEvent),
    /// Target reached; a stop job was issued
    StopIssued(JobSpec),
}

/// Counts from an emergency stop sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmergencyStopReport {
    pub start_events: usize,
    pub monitor_events: usize,
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    Cancel,
    Trigger,
    /// Trigger and mark the cycle as stopped
    Finish,
    Error,
}

pub struct CycleCoordinator {
    store: Arc<dyn EventStore>,
    tx_store: Arc<dyn TransactionalEventStore>,
    artifacts: Arc<dyn JobArtifactStore>,
    registry: Arc<dyn TriggerRegistry>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    builder: JobSpecBuilder,
    planner: CadencePlanner,
    precision_override: bool,
    store_timeout: Duration,
}

impl CycleCoordinator {
    pub fn new(ports: CyclePorts, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let estimator = DurationEstimator::new(config.heating_rate)?;

        Ok(Self {
            store: ports.store,
            tx_store: ports.tx_store,
            artifacts: ports.artifacts.clone(),
            registry: ports.registry,
            id_provider: ports.id_provider,
            time_provider: ports.time_provider,
            builder: JobSpecBuilder::new(ports.secrets, ports.artifacts),
            planner: CadencePlanner::new(estimator),
            precision_override: config.precision_override,
            store_timeout: Duration::from_millis(config.store_timeout_ms),
        })
    }

    /// Schedule a new cycle starting at `start_time`.
    ///
    /// Fails with `Conflict` while any event is still SCHEDULED. The START
    /// event's id is returned and doubles as the cycle id.
    pub async fn schedule_cycle(&self, start_time: i64, target_temp: f64) -> Result<CycleId> {
        self.schedule_at(Some(start_time), target_temp).await
    }

    /// Schedule a new cycle starting at the coordinator's current time
    pub async fn schedule_cycle_now(&self, target_temp: f64) -> Result<CycleId> {
        self.schedule_at(None, target_temp).await
    }

    async fn schedule_at(&self, start_time: Option<i64>, target_temp: f64) -> Result<CycleId> {
        validate_target_temp(target_temp)?;

        let now = self.time_provider.now_millis();
        let start_time = start_time.unwrap_or(now);
        let id = self.id_provider.generate_id();
        let event = HeatingEvent::new_start(&id, start_time, target_temp, now)
            .with_metadata(META_ORIGIN, json!("schedule"));
        event.validate(now)?;

        let spec = self
            .builder
            .build_start_job(&id, target_temp, start_time)
            .await?;

        if let Err(e) = self.insert_exclusive(&event).await {
            warn!(event_id = %id, error = %e, "Failed to persist START event");
            self.cleanup_quietly(&spec).await;
            return Err(e);
        }

        self.register_or_fail(&event, &spec).await?;

        info!(
            cycle_id = %id,
            start_time,
            target_temp,
            cron = event.cron_expression(),
            "Heating cycle scheduled"
        );
        Ok(id)
    }

    /// Cancel every SCHEDULED event of a cycle. Returns how many were cancelled.
    pub async fn cancel_cycle(&self, cycle_id: &str) -> Result<usize> {
        validate_identifier("cycle_id", cycle_id)?;

        let pending = self
            .bounded(self.store.query(&EventFilter::scheduled().for_cycle(cycle_id)))
            .await?;

        let mut cancelled = 0;
        for event in pending {
            if let Some(event) = self.transition(event.id(), Transition::Cancel).await? {
                self.retire_quietly(&event.tag()).await;
                cancelled += 1;
            }
        }

        info!(cycle_id, cancelled, "Cycle cancelled");
        Ok(cancelled)
    }

    /// Chain the next MONITOR check of a cycle.
    ///
    /// The previous monitor (if any) is triggered first; only the invocation
    /// that wins that transition continues. Returns `None` when the firing is
    /// absorbed (duplicate, stale, or the cycle was cancelled).
    pub async fn reschedule_monitor(
        &self,
        cycle_id: &str,
        current_temp: f64,
        target_temp: f64,
        base_time: i64,
        previous_monitor: Option<&str>,
    ) -> Result<Option<HeatingEvent>> {
        validate_identifier("cycle_id", cycle_id)?;
        validate_reading(current_temp)?;
        validate_target_temp(target_temp)?;
        if let Some(previous) = previous_monitor {
            validate_identifier("monitor_id", previous)?;
        }

        let start = self.find_start(cycle_id).await?;

        let mut sequence = 1;
        if let Some(previous) = previous_monitor {
            let monitor = self.find_monitor(cycle_id, previous).await?;
            sequence = monitor
                .metadata()
                .get(META_SEQUENCE)
                .and_then(|v| v.as_u64())
                .unwrap_or(0)
                + 1;

            if self.transition(previous, Transition::Trigger).await?.is_none() {
                info!(cycle_id, monitor_id = previous, "Duplicate monitor firing absorbed");
                return Ok(None);
            }
        }

        if matches!(start.status(), EventStatus::Cancelled | EventStatus::Error) {
            info!(cycle_id, status = %start.status(), "Cycle no longer running, not extending");
            return Ok(None);
        }

        if previous_monitor.is_none()
            && start.status() == EventStatus::Triggered
            && self.cycle_finished_or_chained(&start).await?
        {
            info!(cycle_id, "Cycle already chained or stopped, first monitor absorbed");
            return Ok(None);
        }

        let now = self.time_provider.now_millis();
        let plan = self.plan_check(current_temp, target_temp, base_time, now);

        let monitor_id = self.id_provider.generate_id();
        let mut monitor =
            HeatingEvent::new_monitor(&monitor_id, cycle_id, plan.next_check_at, target_temp, now)
                .with_metadata(META_ORIGIN, json!("reschedule"))
                .with_metadata(META_SEQUENCE, json!(sequence))
                .with_metadata(META_CADENCE, json!(plan.mode.to_string()));
        if let Some(previous) = previous_monitor {
            monitor = monitor.with_metadata(META_PREVIOUS_MONITOR, json!(previous));
        }
        monitor.validate(now)?;

        let spec = self
            .builder
            .build_monitor_job(cycle_id, &monitor_id, plan.next_check_at)
            .await?;

        match self.insert_successor(&monitor).await {
            Ok(true) => {}
            Ok(false) => {
                info!(cycle_id, "Cycle already has a pending monitor, absorbed");
                self.cleanup_quietly(&spec).await;
                return Ok(None);
            }
            Err(e) => {
                warn!(monitor_id = %monitor_id, error = %e, "Failed to persist MONITOR event");
                self.cleanup_quietly(&spec).await;
                return Err(e);
            }
        }

        self.register_or_fail(&monitor, &spec).await?;

        info!(
            cycle_id,
            monitor_id = %monitor_id,
            mode = %plan.mode,
            next_check_at = plan.next_check_at,
            sequence,
            "Monitor check scheduled"
        );
        Ok(Some(monitor))
    }

    /// Handle the START job firing with the current reading
    pub async fn on_start_fired(&self, event_id: &str, current_temp: f64) -> Result<FiringOutcome> {
        validate_identifier("event_id", event_id)?;
        validate_reading(current_temp)?;

        let start = self.find_start(event_id).await?;
        let target = start.target_temp();
        let reached = current_temp >= target;

        let transition = if reached {
            Transition::Finish
        } else {
            Transition::Trigger
        };
        if self.transition(event_id, transition).await?.is_none() {
            info!(event_id, status = %start.status(), "Duplicate START firing absorbed");
            return Ok(FiringOutcome::Absorbed);
        }

        if reached {
            let stop = self.issue_stop(event_id, TARGET_REACHED_REASON).await?;
            return Ok(FiringOutcome::StopIssued(stop));
        }

        let now = self.time_provider.now_millis();
        Ok(self
            .reschedule_monitor(event_id, current_temp, target, now, None)
            .await?
            .map_or(FiringOutcome::Absorbed, FiringOutcome::MonitorScheduled))
    }

    /// Handle a MONITOR job firing: stop at target, otherwise chain the next check
    pub async fn on_monitor_fired(
        &self,
        cycle_id: &str,
        monitor_id: &str,
        current_temp: f64,
    ) -> Result<FiringOutcome> {
        validate_identifier("cycle_id", cycle_id)?;
        validate_identifier("monitor_id", monitor_id)?;
        validate_reading(current_temp)?;

        let monitor = self.find_monitor(cycle_id, monitor_id).await?;
        let target = monitor.target_temp();

        if current_temp < target {
            let now = self.time_provider.now_millis();
            return Ok(self
                .reschedule_monitor(cycle_id, current_temp, target, now, Some(monitor_id))
                .await?
                .map_or(FiringOutcome::Absorbed, FiringOutcome::MonitorScheduled));
        }

        if self.transition(monitor_id, Transition::Trigger).await?.is_none() {
            info!(cycle_id, monitor_id, "Duplicate monitor firing absorbed");
            return Ok(FiringOutcome::Absorbed);
        }

        info!(cycle_id, monitor_id, current_temp, target, "Target temperature reached");
        let stop = self.issue_stop(cycle_id, TARGET_REACHED_REASON).await?;
        Ok(FiringOutcome::StopIssued(stop))
    }

    /// Delete TRIGGERED/CANCELLED events finished more than `max_age_hours` ago.
    ///
    /// SCHEDULED and ERROR events are never reaped.
    pub async fn reap_orphans(&self, max_age_hours: i64) -> Result<u64> {
        if max_age_hours < 0 {
            return Err(AppError::InvalidArgument(format!(
                "max_age_hours must not be negative, got {}",
                max_age_hours
            )));
        }

        let cutoff = self
            .time_provider
            .now_millis()
            .saturating_sub(max_age_hours.saturating_mul(MILLIS_PER_HOUR));
        let filter = EventFilter::new()
            .with_status(EventStatus::Triggered)
            .with_status(EventStatus::Cancelled)
            .finished_before(cutoff);

        let orphans = self.bounded(self.store.query(&filter)).await?;
        if orphans.is_empty() {
            debug!(max_age_hours, "No orphaned events");
            return Ok(0);
        }

        for event in &orphans {
            self.retire_quietly(&event.tag()).await;
        }

        let ids: Vec<String> = orphans.iter().map(|e| e.id().to_string()).collect();
        let reaped = self.bounded(self.store.delete(&ids)).await?;

        info!(reaped, max_age_hours, "Orphaned events reaped");
        Ok(reaped)
    }

    /// Whether a fired job may still run.
    ///
    /// START and MONITOR jobs run only while their event is SCHEDULED. A job
    /// whose event was cancelled, already handled, or reaped is absorbed and
    /// its registration and artifact are retired. Stop jobs always run.
    pub async fn admit_firing(&self, spec: &JobSpec) -> Result<bool> {
        let event_type = match spec.kind {
            JobKind::StartHeating => EventType::Start,
            JobKind::MonitorTemp => EventType::Monitor,
            JobKind::StopHeating => return Ok(true),
        };

        let event = self
            .bounded(self.store.find_by_id(spec.tag.id()))
            .await?
            .filter(|e| e.event_type() == event_type);

        match event {
            Some(event) if event.status() == EventStatus::Scheduled => Ok(true),
            other => {
                let status = other
                    .map_or_else(|| "missing".to_string(), |e| e.status().to_string());
                info!(tag = %spec.tag, %status, "Job no longer scheduled, firing absorbed");
                self.unregister_quietly(&spec.tag).await;
                self.cleanup_quietly(spec).await;
                Ok(false)
            }
        }
    }

    /// Fire a job through `dispatcher` if it is still admitted, then retire it.
    ///
    /// Returns `None` when the firing was absorbed without calling out.
    pub async fn fire_job(
        &self,
        dispatcher: &TriggerDispatcher,
        spec: &JobSpec,
    ) -> Result<Option<FireReport>> {
        if !self.admit_firing(spec).await? {
            return Ok(None);
        }

        let report = dispatcher.fire(spec).await?;
        self.unregister_quietly(&spec.tag).await;
        self.cleanup_quietly(spec).await;
        Ok(Some(report))
    }

    /// Cancel every SCHEDULED START event and sweep the START namespace
    pub async fn cancel_all_start_events(&self) -> Result<usize> {
        self.cancel_all(EventType::Start, TagNamespace::Start).await
    }

    /// Cancel every SCHEDULED MONITOR event and sweep the MONITOR namespace
    /// (which also removes pending stop jobs)
    pub async fn cancel_all_monitor_events(&self) -> Result<usize> {
        self.cancel_all(EventType::Monitor, TagNamespace::Monitor)
            .await
    }

    /// Safety stop: cancel everything pending and clear all registrations
    pub async fn emergency_stop(&self) -> Result<EmergencyStopReport> {
        let report = EmergencyStopReport {
            start_events: self.cancel_all_start_events().await?,
            monitor_events: self.cancel_all_monitor_events().await?,
        };
        warn!(
            start_events = report.start_events,
            monitor_events = report.monitor_events,
            "Emergency stop executed"
        );
        Ok(report)
    }

    /// Cycle that currently blocks scheduling, if any
    pub async fn active_cycle(&self) -> Result<Option<CycleId>> {
        let pending = self
            .bounded(self.store.query(&EventFilter::scheduled().limit(1)))
            .await?;
        Ok(pending
            .first()
            .and_then(|e| e.cycle_id().map(str::to_string)))
    }

    /// All events of a cycle, oldest first
    pub async fn cycle_events(&self, cycle_id: &str) -> Result<Vec<HeatingEvent>> {
        validate_identifier("cycle_id", cycle_id)?;
        self.bounded(self.store.query(&EventFilter::new().for_cycle(cycle_id)))
            .await
    }

    // ------------------------------------------------------------------------

    async fn cancel_all(&self, event_type: EventType, namespace: TagNamespace) -> Result<usize> {
        let pending = self
            .bounded(
                self.store
                    .query(&EventFilter::scheduled().with_type(event_type)),
            )
            .await?;

        let mut cancelled = 0;
        for event in pending {
            if self
                .transition(event.id(), Transition::Cancel)
                .await?
                .is_some()
            {
                cancelled += 1;
            }
        }

        match self.registry.unregister_namespace(namespace).await {
            Ok(removed) => debug!(namespace = namespace.marker(), removed, "Trigger namespace swept"),
            Err(e) => warn!(namespace = namespace.marker(), error = %e, "Trigger namespace sweep failed"),
        }
        match self.artifacts.remove_namespace(namespace).await {
            Ok(removed) => debug!(namespace = namespace.marker(), removed, "Artifact namespace swept"),
            Err(e) => warn!(namespace = namespace.marker(), error = %e, "Artifact namespace sweep failed"),
        }

        info!(event_type = %event_type, cancelled, "Bulk cancellation complete");
        Ok(cancelled)
    }

    /// Versioned read-modify-write of one status transition.
    ///
    /// Returns the updated event if this call performed the transition, `None`
    /// if the event was already terminal (including when a concurrent caller
    /// won the race).
    async fn transition(&self, id: &str, transition: Transition) -> Result<Option<HeatingEvent>> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut event = self
                .bounded(self.store.find_by_id(id))
                .await?
                .ok_or_else(|| AppError::NotFound(format!("event {}", id)))?;

            let now = self.time_provider.now_millis();
            let changed = match transition {
                Transition::Cancel => event.cancel(now),
                Transition::Trigger => event.trigger(now),
                Transition::Finish => {
                    let changed = event.trigger(now);
                    if changed {
                        event.annotate(META_STOPPED, json!(true));
                    }
                    changed
                }
                Transition::Error => event.mark_error(now),
            };
            if !changed {
                debug!(event_id = id, status = %event.status(), ?transition, "Transition absorbed");
                return Ok(None);
            }

            match self.bounded(self.store.update(&event)).await {
                Ok(version) => {
                    event.record_version(version);
                    debug!(event_id = id, status = %event.status(), version, "Event transitioned");
                    return Ok(Some(event));
                }
                Err(AppError::StaleVersion { .. }) if attempt < TRANSITION_ATTEMPTS => {
                    debug!(event_id = id, attempt, "Stale version, re-reading");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Insert a START event unless any event is still SCHEDULED
    async fn insert_exclusive(&self, event: &HeatingEvent) -> Result<()> {
        let mut tx = self.bounded(self.tx_store.begin_transaction()).await?;

        let active = tx.query(&EventFilter::scheduled().limit(1)).await?;
        if let Some(existing) = active.first() {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "cycle {} is still active (event {} scheduled for {})",
                existing.cycle_id().unwrap_or(existing.id()),
                existing.id(),
                existing.scheduled_for()
            )));
        }

        tx.insert(event).await?;
        tx.commit().await
    }

    /// Insert a MONITOR event unless its cycle already has one pending.
    /// Returns false when another invocation got there first, and fails with
    /// `Conflict` when a different cycle has become active meanwhile.
    async fn insert_successor(&self, monitor: &HeatingEvent) -> Result<bool> {
        let Some(cycle_id) = monitor.cycle_id() else {
            return Err(AppError::Domain(DomainError::MissingCycleId(
                monitor.id().to_string(),
            )));
        };

        let mut tx = self.bounded(self.tx_store.begin_transaction()).await?;
        let pending = tx.query(&EventFilter::scheduled()).await?;

        if let Some(other) = pending.iter().find(|e| e.cycle_id() != Some(cycle_id)) {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "cycle {} became active while cycle {} was between checks (event {})",
                other.cycle_id().unwrap_or(other.id()),
                cycle_id,
                other.id()
            )));
        }
        if pending.iter().any(|e| e.event_type() == EventType::Monitor) {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.insert(monitor).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Register the trigger; on failure mark the event ERROR and drop the artifact
    async fn register_or_fail(&self, event: &HeatingEvent, spec: &JobSpec) -> Result<()> {
        let Err(e) = self.registry.register(spec).await else {
            return Ok(());
        };

        error!(event_id = event.id(), tag = %spec.tag, error = %e, "Trigger registration failed");
        if let Err(mark) = self.transition(event.id(), Transition::Error).await {
            error!(event_id = event.id(), error = %mark, "Failed to mark event as ERROR");
        }
        self.cleanup_quietly(spec).await;
        Err(e)
    }

    async fn issue_stop(&self, cycle_id: &str, reason: &str) -> Result<JobSpec> {
        let stop_id = self.id_provider.generate_id();
        let now = self.time_provider.now_millis();
        let spec = self
            .builder
            .build_stop_job(cycle_id, &stop_id, reason, now)
            .await?;

        if let Err(e) = self.registry.register(&spec).await {
            error!(cycle_id, tag = %spec.tag, error = %e, "Stop job registration failed");
            self.cleanup_quietly(&spec).await;
            return Err(e);
        }

        info!(cycle_id, tag = %spec.tag, reason, "Stop job issued");
        Ok(spec)
    }

    fn plan_check(&self, current: f64, target: f64, base_time: i64, now: i64) -> CheckPlan {
        let plan = self
            .planner
            .plan(current, target, base_time, self.precision_override);
        if plan.next_check_at >= now {
            return plan;
        }

        // Late firing: the planned check already passed, plan from now instead
        warn!(base_time, now, "Monitor firing arrived late, planning from now");
        self.planner
            .plan(current, target, now, self.precision_override)
    }

    async fn find_start(&self, cycle_id: &str) -> Result<HeatingEvent> {
        self.bounded(self.store.find_by_id(cycle_id))
            .await?
            .filter(|e| e.event_type() == EventType::Start)
            .ok_or_else(|| AppError::NotFound(format!("cycle {}", cycle_id)))
    }

    async fn find_monitor(&self, cycle_id: &str, monitor_id: &str) -> Result<HeatingEvent> {
        let monitor = self
            .bounded(self.store.find_by_id(monitor_id))
            .await?
            .filter(|e| e.event_type() == EventType::Monitor)
            .ok_or_else(|| AppError::NotFound(format!("monitor {}", monitor_id)))?;

        if monitor.cycle_id() != Some(cycle_id) {
            return Err(AppError::InvalidArgument(format!(
                "monitor {} does not belong to cycle {}",
                monitor_id, cycle_id
            )));
        }
        Ok(monitor)
    }

    /// A triggered START whose cycle already stopped or has monitors
    async fn cycle_finished_or_chained(&self, start: &HeatingEvent) -> Result<bool> {
        if start.metadata().get(META_STOPPED) == Some(&json!(true)) {
            return Ok(true);
        }
        let monitors = self
            .bounded(
                self.store.query(
                    &EventFilter::new()
                        .with_type(EventType::Monitor)
                        .for_cycle(start.id())
                        .limit(1),
                ),
            )
            .await?;
        Ok(!monitors.is_empty())
    }

    /// Drop a job's registration and its artifact
    async fn retire_quietly(&self, tag: &JobTag) {
        self.unregister_quietly(tag).await;
        if let Err(e) = self.artifacts.remove_tag(tag).await {
            warn!(tag = %tag, error = %e, "Failed to remove job artifact");
        }
    }

    async fn unregister_quietly(&self, tag: &JobTag) {
        if let Err(e) = self.registry.unregister(tag).await {
            warn!(tag = %tag, error = %e, "Failed to unregister trigger");
        }
    }

    async fn cleanup_quietly(&self, spec: &JobSpec) {
        if let Err(e) = self.builder.cleanup(spec).await {
            warn!(tag = %spec.tag, error = %e, "Failed to clean up job artifact");
        }
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.store_timeout, operation)
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Store(format!(
                    "store operation timed out after {}ms",
                    self.store_timeout.as_millis()
                )))
            })
    }
}

fn validate_reading(current_temp: f64) -> Result<()> {
    if !current_temp.is_finite() {
        return Err(AppError::InvalidArgument(format!(
            "temperature reading is not a number: {}",
            current_temp
        )));
    }
    if !(MIN_READING_F..=MAX_READING_F).contains(&current_temp) {
        return Err(AppError::InvalidArgument(format!(
            "temperature reading {}°F outside plausible range {}..={}°F",
            current_temp, MIN_READING_F, MAX_READING_F
        )));
    }
    Ok(())
}
