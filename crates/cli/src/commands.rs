//! Subcommand handlers: wire adapters into the core services and print results

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use colored::Colorize;
use hottub_core::application::job_builder::rfc3339;
use hottub_core::application::{
    CadencePlanner, CycleCoordinator, CyclePorts, DurationEstimator, FiringOutcome,
    TriggerDispatcher, TriggerRetryPolicy,
};
use hottub_core::domain::HeatingEvent;
use hottub_core::port::id_provider::UuidProvider;
use hottub_core::port::time_provider::SystemTimeProvider;
use hottub_core::port::{SecretStore, TimeProvider};
use hottub_infra_sqlite::{create_pool, run_migrations, SqliteEventStore};
use hottub_infra_system::{
    CommandTransport, FileArtifactStore, FileSecretStore, SpoolTriggerRegistry,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing::info;

use crate::settings::Settings;

#[derive(Tabled)]
struct EventRow {
    id: String,
    #[tabled(rename = "type")]
    event_type: String,
    status: String,
    scheduled_for: String,
    #[tabled(rename = "target °F")]
    target: String,
    finished_at: String,
}

impl From<&HeatingEvent> for EventRow {
    fn from(event: &HeatingEvent) -> Self {
        Self {
            id: event.id().to_string(),
            event_type: event.event_type().to_string(),
            status: event.status().to_string(),
            scheduled_for: display_time(event.scheduled_for()),
            target: format!("{:.1}", event.target_temp()),
            finished_at: event.finished_at().map(display_time).unwrap_or_default(),
        }
    }
}

fn display_time(epoch_millis: i64) -> String {
    rfc3339(epoch_millis).unwrap_or_else(|_| epoch_millis.to_string())
}

fn secret_store(settings: &Settings) -> Arc<FileSecretStore> {
    Arc::new(FileSecretStore::new(
        &settings.secret_path,
        &settings.audit_log,
        Arc::new(SystemTimeProvider),
    ))
}

/// Open (and migrate) the event store, then assemble the coordinator
async fn coordinator(settings: &Settings) -> Result<CycleCoordinator> {
    if let Some(parent) = settings.database_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let timeout = Duration::from_millis(settings.engine.store_timeout_ms);
    let pool = create_pool(&settings.database_url(), timeout)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let store = Arc::new(SqliteEventStore::new(pool, time_provider.clone()));

    let ports = CyclePorts {
        store: store.clone(),
        tx_store: store,
        secrets: secret_store(settings),
        artifacts: Arc::new(FileArtifactStore::new(&settings.artifact_dir)),
        registry: Arc::new(SpoolTriggerRegistry::new(&settings.spool_dir)),
        id_provider: Arc::new(UuidProvider),
        time_provider,
    };

    Ok(CycleCoordinator::new(ports, &settings.engine)?)
}

/// RFC 3339 timestamp -> epoch ms. `None` means "now", resolved by the
/// coordinator against the same clock it validates with.
fn parse_start(raw: &str) -> Result<Option<i64>> {
    if raw.eq_ignore_ascii_case("now") {
        return Ok(None);
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid start time '{}' (expected RFC 3339 or 'now')", raw))?;
    Ok(Some(parsed.timestamp_millis()))
}

fn print_outcome(outcome: &FiringOutcome) {
    match outcome {
        FiringOutcome::Absorbed => {
            println!("{}", "○ Duplicate or stale firing absorbed".yellow());
        }
        FiringOutcome::MonitorScheduled(monitor) => {
            println!("{}", "✓ Next temperature check scheduled".green().bold());
            println!("  {} {}", "Monitor:".bold(), monitor.id());
            println!("  {} {}", "At:".bold(), display_time(monitor.scheduled_for()));
        }
        FiringOutcome::StopIssued(stop) => {
            println!("{}", "✓ Target reached, stop issued".green().bold());
            println!("  {} {}", "Job:".bold(), stop.tag);
        }
    }
}

pub async fn secret_init(settings: &Settings) -> Result<()> {
    let store = secret_store(settings);
    store.initialize().await.context("Secret initialization failed")?;
    println!("{}", "✓ Secret ready".green().bold());
    println!("  {} {}", "Path:".bold(), store.path().display());
    Ok(())
}

pub async fn secret_rotate(settings: &Settings) -> Result<()> {
    let store = secret_store(settings);
    let (previous, _) = store.rotate().await.context("Secret rotation failed")?;
    println!("{}", "✓ Secret rotated".green().bold());
    if previous.is_none() {
        println!("  {} no valid previous secret", "•".bold());
    }
    Ok(())
}

pub async fn secret_verify(settings: &Settings, candidate: &str) -> Result<()> {
    if !secret_store(settings).verify(candidate).await? {
        bail!("Secret does not match");
    }
    println!("{}", "✓ Secret matches".green().bold());
    Ok(())
}

pub async fn schedule(settings: &Settings, start: &str, target: f64) -> Result<()> {
    let start_time = parse_start(start)?;
    let coordinator = coordinator(settings).await?;
    let cycle_id = match start_time {
        Some(start_time) => coordinator.schedule_cycle(start_time, target).await?,
        None => coordinator.schedule_cycle_now(target).await?,
    };
    let scheduled_for = coordinator
        .cycle_events(&cycle_id)
        .await?
        .first()
        .map(|start| start.scheduled_for());

    println!("{}", "✓ Heating cycle scheduled".green().bold());
    println!();
    println!("  {} {}", "Cycle:".bold(), cycle_id);
    if let Some(scheduled_for) = scheduled_for {
        println!("  {} {}", "Start:".bold(), display_time(scheduled_for));
    }
    println!("  {} {:.1} °F", "Target:".bold(), target);
    Ok(())
}

pub async fn cancel(settings: &Settings, cycle_id: &str) -> Result<()> {
    let cancelled = coordinator(settings).await?.cancel_cycle(cycle_id).await?;
    if cancelled == 0 {
        println!("{}", format!("○ Nothing pending for cycle {}", cycle_id).yellow());
    } else {
        println!(
            "{}",
            format!("✓ Cycle {} cancelled ({} events)", cycle_id, cancelled)
                .green()
                .bold()
        );
    }
    Ok(())
}

pub async fn start_fired(settings: &Settings, event_id: &str, current: f64) -> Result<()> {
    let outcome = coordinator(settings)
        .await?
        .on_start_fired(event_id, current)
        .await?;
    print_outcome(&outcome);
    Ok(())
}

pub async fn monitor_fired(
    settings: &Settings,
    cycle_id: &str,
    monitor_id: &str,
    current: f64,
) -> Result<()> {
    let outcome = coordinator(settings)
        .await?
        .on_monitor_fired(cycle_id, monitor_id, current)
        .await?;
    print_outcome(&outcome);
    Ok(())
}

/// Fire one job. On success its registration and artifact are removed;
/// on failure both stay so the timer can retry.
pub async fn fire(settings: &Settings, artifact: &Path) -> Result<()> {
    let Some(program) = &settings.hook_program else {
        bail!("No hook_program configured; cannot fire jobs");
    };

    let spec = FileArtifactStore::load(artifact).await?;
    let coordinator = coordinator(settings).await?;
    let secrets: Arc<dyn SecretStore> = secret_store(settings);
    let transport = CommandTransport::new(
        program,
        Duration::from_millis(settings.hook_timeout_ms),
    )
    .with_args(settings.hook_args.clone());

    let dispatcher = TriggerDispatcher::new(
        secrets,
        Arc::new(transport),
        TriggerRetryPolicy::from_config(&settings.engine),
    );
    let Some(report) = coordinator
        .fire_job(&dispatcher, &spec)
        .await
        .with_context(|| format!("Firing {} failed", spec.tag))?
    else {
        println!(
            "{}",
            format!("○ {} is no longer scheduled, firing absorbed", spec.tag).yellow()
        );
        return Ok(());
    };

    info!(tag = %report.tag, attempts = report.attempts, "Job fired and retired");
    println!(
        "{}",
        format!("✓ {} fired ({} attempts)", report.endpoint, report.attempts)
            .green()
            .bold()
    );
    Ok(())
}

pub async fn reap(settings: &Settings, max_age_hours: Option<i64>) -> Result<()> {
    let hours = max_age_hours.unwrap_or(settings.engine.retention_hours);
    let reaped = coordinator(settings).await?.reap_orphans(hours).await?;
    println!(
        "  {} {} finished events older than {}h deleted",
        "✓".green(),
        reaped,
        hours
    );
    Ok(())
}

pub async fn emergency_stop(settings: &Settings) -> Result<()> {
    let report = coordinator(settings).await?.emergency_stop().await?;
    println!("{}", "⚠ Emergency stop executed".red().bold());
    println!();
    println!("  {} {}", "START events cancelled:".bold(), report.start_events);
    println!("  {} {}", "MONITOR events cancelled:".bold(), report.monitor_events);
    Ok(())
}

pub async fn status(settings: &Settings) -> Result<()> {
    let coordinator = coordinator(settings).await?;
    let registrations = SpoolTriggerRegistry::new(&settings.spool_dir).list().await?;

    println!("{}", "Heating Status".cyan().bold());
    println!();
    println!("  {} {}", "Registered jobs:".bold(), registrations.len());

    let Some(cycle_id) = coordinator.active_cycle().await? else {
        println!("  {} {}", "Cycle:".bold(), "IDLE".yellow());
        return Ok(());
    };

    println!("  {} {} ({})", "Cycle:".bold(), cycle_id, "ACTIVE".green());
    println!();

    let events = coordinator.cycle_events(&cycle_id).await?;
    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

pub fn estimate(settings: &Settings, current: f64, target: f64) -> Result<()> {
    let estimator = DurationEstimator::new(settings.engine.heating_rate)?;
    let minutes = estimator.estimate_minutes(current, target);
    let plan = CadencePlanner::new(estimator).plan(
        current,
        target,
        SystemTimeProvider.now_millis(),
        settings.engine.precision_override,
    );

    println!("{}", "Heating Estimate".cyan().bold());
    println!();
    println!("  {} {} minutes", "Time to target:".bold(), minutes);
    println!("  {} {}", "Cadence:".bold(), plan.mode);
    println!("  {} {} s", "Check interval:".bold(), plan.interval.as_secs());
    Ok(())
}
