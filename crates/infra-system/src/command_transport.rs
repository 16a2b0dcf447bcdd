// Hook-program TriggerTransport
//
// Fires a job by running a configured program with the call described in its
// environment. The program performs the actual device call and reports the
// outcome through its exit status.

use async_trait::async_trait;
use hottub_core::domain::Secret;
use hottub_core::port::{TriggerError, TriggerTransport};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

/// EX_TEMPFAIL from sysexits.h: the hook asks to be retried
pub const EXIT_TEMPFAIL: i32 = 75;

pub const ENV_ENDPOINT: &str = "HOT_TUB_ENDPOINT";
pub const ENV_AUTH: &str = "HOT_TUB_AUTH";
pub const ENV_PARAM_PREFIX: &str = "HOT_TUB_PARAM_";

/// Variables passed through from the parent environment by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "TZ"];

pub struct CommandTransport {
    program: PathBuf,
    args: Vec<String>,
    env_allowlist: Vec<String>,
    call_timeout: Duration,
}

impl CommandTransport {
    pub fn new(program: impl Into<PathBuf>, call_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env_allowlist: DEFAULT_ENV_ALLOWLIST
                .iter()
                .map(|name| name.to_string())
                .collect(),
            call_timeout,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env_allowlist(mut self, env_allowlist: Vec<String>) -> Self {
        self.env_allowlist = env_allowlist;
        self
    }

    /// Allowlisted parent variables plus the call description.
    /// The secret travels only in the environment, never in argv.
    fn build_env(
        &self,
        parent: impl Iterator<Item = (String, String)>,
        endpoint: &str,
        parameters: &BTreeMap<String, String>,
        secret: &Secret,
    ) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = parent
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect();

        env.insert(ENV_ENDPOINT.to_string(), endpoint.to_string());
        for (name, value) in parameters {
            env.insert(param_var(name), value.clone());
        }
        env.insert(ENV_AUTH.to_string(), secret.expose().to_string());
        env
    }
}

/// `target_temp` -> `HOT_TUB_PARAM_TARGET_TEMP`
fn param_var(name: &str) -> String {
    let normalized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", ENV_PARAM_PREFIX, normalized)
}

/// Exit status -> trigger outcome
fn classify(code: Option<i32>, stderr: &str) -> Result<(), TriggerError> {
    match code {
        Some(0) => Ok(()),
        Some(EXIT_TEMPFAIL) => Err(TriggerError::Transient(format!(
            "hook asked for retry: {}",
            stderr.trim()
        ))),
        Some(code) => Err(TriggerError::Permanent(format!(
            "hook exited with {}: {}",
            code,
            stderr.trim()
        ))),
        None => Err(TriggerError::Transient(
            "hook terminated by signal".to_string(),
        )),
    }
}

#[async_trait]
impl TriggerTransport for CommandTransport {
    async fn invoke(
        &self,
        endpoint: &str,
        parameters: &BTreeMap<String, String>,
        secret: &Secret,
    ) -> Result<(), TriggerError> {
        let env = self.build_env(std::env::vars(), endpoint, parameters, secret);

        info!(
            program = %self.program.display(),
            endpoint,
            timeout_ms = self.call_timeout.as_millis() as u64,
            "Invoking trigger hook"
        );

        let child = Command::new(&self.program)
            .args(&self.args)
            .env_clear()
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TriggerError::Permanent(format!("failed to spawn hook: {}", e)))?;

        let output = match timeout(self.call_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(TriggerError::Transient(format!("hook I/O error: {}", e))),
            Err(_) => {
                warn!(endpoint, "Trigger hook timed out");
                return Err(TriggerError::Transient(format!(
                    "hook timed out after {} ms",
                    self.call_timeout.as_millis()
                )));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        let result = classify(output.status.code(), &stderr);

        info!(
            endpoint,
            exit_code = ?output.status.code(),
            ok = result.is_ok(),
            "Trigger hook completed"
        );
        result
    }
}
