//! Layered settings: built-in defaults, then an optional TOML file, then
//! `HOTTUB_*` environment variables.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use hottub_core::EngineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "HOTTUB";
const CONFIG_FILE: &str = "hottub.toml";
const FALLBACK_HOME: &str = "~/.hottub";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database holding heating events
    pub database_path: PathBuf,

    /// Shared secret file (owner-only)
    pub secret_path: PathBuf,

    /// Security audit log for secret mutations
    pub audit_log: PathBuf,

    /// Ephemeral job artifacts
    pub artifact_dir: PathBuf,

    /// Registrations consumed by the external timer
    pub spool_dir: PathBuf,

    /// Program that performs a fired call (`hottub fire`)
    pub hook_program: Option<PathBuf>,
    pub hook_args: Vec<String>,
    pub hook_timeout_ms: u64,

    /// `pretty` or `json`
    pub log_format: String,

    /// Daily rolling log files are written here when set
    pub log_dir: Option<PathBuf>,

    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            database_path: data_dir.join("events.db"),
            secret_path: data_dir.join("hottub.secret"),
            audit_log: data_dir.join("secret-audit.log"),
            artifact_dir: data_dir.join("jobs"),
            spool_dir: data_dir.join("spool"),
            hook_program: None,
            hook_args: Vec::new(),
            hook_timeout_ms: 30_000,
            log_format: "pretty".to_string(),
            log_dir: None,
            engine: EngineConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings. An explicit `config_path` must exist; the platform
    /// default file is optional.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let (file, required) = match config_path {
            Some(path) => (expand(path), true),
            None => (default_config_file(), false),
        };

        let settings: Settings = config::Config::builder()
            .add_source(config::File::from(file.clone()).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load configuration from {}", file.display()))?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.engine.validate()?;
        Ok(settings.expanded())
    }

    /// sqlx connection URL for `database_path`
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.database_path.display())
    }

    /// Resolve `~` in every path
    fn expanded(mut self) -> Self {
        self.database_path = expand(&self.database_path);
        self.secret_path = expand(&self.secret_path);
        self.audit_log = expand(&self.audit_log);
        self.artifact_dir = expand(&self.artifact_dir);
        self.spool_dir = expand(&self.spool_dir);
        self.hook_program = self.hook_program.as_deref().map(expand);
        self.log_dir = self.log_dir.as_deref().map(expand);
        self
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "hottub")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| expand(Path::new(FALLBACK_HOME)))
}

fn default_config_file() -> PathBuf {
    ProjectDirs::from("", "", "hottub")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
        .unwrap_or_else(|| expand(Path::new(FALLBACK_HOME)).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
database_path = "/var/lib/hottub/events.db"
hook_program = "/usr/local/bin/hottub-hook"
hook_args = ["--device", "spa"]

[engine]
heating_rate = 0.75
retention_hours = 48
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.database_url(), "sqlite:///var/lib/hottub/events.db");
        assert_eq!(settings.hook_args, vec!["--device", "spa"]);
        assert_eq!(settings.engine.heating_rate, 0.75);
        assert_eq!(settings.engine.retention_hours, 48);
        // Untouched keys keep their defaults
        assert_eq!(settings.engine.trigger_max_retries, 2);
        assert_eq!(settings.hook_timeout_ms, 30_000);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_invalid_engine_config_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[engine]\nheating_rate = 0.0").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_tilde_is_expanded() {
        let expanded = expand(Path::new("~/spool"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
