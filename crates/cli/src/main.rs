//! Hot Tub CLI - composition root for the heating-cycle engine
//!
//! Every subcommand is one short-lived invocation: the external timer runs
//! `hottub fire`, the device-side hook reports back through `start-fired` /
//! `monitor-fired`, and operators use the rest.

mod commands;
mod logging;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "hottub")]
#[command(about = "Hot tub heating-cycle scheduler", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "HOTTUB_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the shared callback secret
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Schedule a heating cycle
    Schedule {
        /// Start time (RFC 3339) or "now"
        #[arg(long, default_value = "now")]
        start: String,

        /// Target temperature (°F)
        #[arg(long)]
        target: f64,
    },

    /// Cancel every pending event of a cycle
    Cancel {
        /// Cycle ID
        cycle_id: String,
    },

    /// Report that the START job fired
    StartFired {
        /// START event ID
        event_id: String,

        /// Current water temperature (°F)
        #[arg(long)]
        current: f64,
    },

    /// Report that a MONITOR job fired
    MonitorFired {
        /// Cycle ID
        cycle_id: String,

        /// MONITOR event ID
        monitor_id: String,

        /// Current water temperature (°F)
        #[arg(long)]
        current: f64,
    },

    /// Fire a job from its artifact (run by the external timer)
    Fire {
        /// Job artifact path
        artifact: PathBuf,
    },

    /// Delete finished events older than the retention window
    Reap {
        /// Override the configured retention (hours)
        #[arg(long)]
        max_age_hours: Option<i64>,
    },

    /// Cancel everything pending and clear all registrations
    EmergencyStop,

    /// Show the active cycle and its events
    Status,

    /// Estimate heating time and the monitor cadence
    Estimate {
        /// Current water temperature (°F)
        #[arg(long)]
        current: f64,

        /// Target temperature (°F)
        #[arg(long)]
        target: f64,
    },
}

#[derive(Subcommand)]
enum SecretAction {
    /// Create the secret if missing (or corrupt)
    Init,

    /// Replace the secret, keeping a backup of the old value
    Rotate,

    /// Check a candidate value against the current secret
    Verify {
        /// Candidate secret
        #[arg(long, env = "HOT_TUB_AUTH", hide_env_values = true)]
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Configuration
    let settings = Settings::load(cli.config.as_deref())?;

    // 2. Logging (guard flushes the file writer on exit)
    let _log_guard = logging::init(&settings.log_format, settings.log_dir.as_deref())?;
    debug!(version = hottub_core::VERSION, database = %settings.database_path.display(), "hottub starting");

    // 3. Dispatch
    match cli.command {
        Commands::Secret { action } => match action {
            SecretAction::Init => commands::secret_init(&settings).await,
            SecretAction::Rotate => commands::secret_rotate(&settings).await,
            SecretAction::Verify { value } => commands::secret_verify(&settings, &value).await,
        },
        Commands::Schedule { start, target } => {
            commands::schedule(&settings, &start, target).await
        }
        Commands::Cancel { cycle_id } => commands::cancel(&settings, &cycle_id).await,
        Commands::StartFired { event_id, current } => {
            commands::start_fired(&settings, &event_id, current).await
        }
        Commands::MonitorFired {
            cycle_id,
            monitor_id,
            current,
        } => commands::monitor_fired(&settings, &cycle_id, &monitor_id, current).await,
        Commands::Fire { artifact } => commands::fire(&settings, &artifact).await,
        Commands::Reap { max_age_hours } => commands::reap(&settings, max_age_hours).await,
        Commands::EmergencyStop => commands::emergency_stop(&settings).await,
        Commands::Status => commands::status(&settings).await,
        Commands::Estimate { current, target } => commands::estimate(&settings, current, target),
    }
}
