// Trigger Dispatcher - the fire-time side of a job
//
// Resolves the secret reference to the current value and performs the named
// operation, retrying transient failures per the retry policy.

use super::retry::{RetryDecision, TriggerRetryPolicy};
use crate::domain::{JobSpec, JobTag};
use crate::error::Result;
use crate::port::{SecretStore, TriggerError, TriggerTransport};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a successful fire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireReport {
    pub tag: JobTag,
    pub endpoint: &'static str,
    pub attempts: u32,
}

pub struct TriggerDispatcher {
    secrets: Arc<dyn SecretStore>,
    transport: Arc<dyn TriggerTransport>,
    policy: TriggerRetryPolicy,
}

impl TriggerDispatcher {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        transport: Arc<dyn TriggerTransport>,
        policy: TriggerRetryPolicy,
    ) -> Self {
        Self {
            secrets,
            transport,
            policy,
        }
    }

    /// Fire one job.
    ///
    /// The secret is read now, not when the job was built, so rotations
    /// between build and fire are picked up.
    pub async fn fire(&self, spec: &JobSpec) -> Result<FireReport> {
        let secret = self.secrets.current().await?;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let error = match self
                .transport
                .invoke(spec.endpoint(), &spec.parameters, &secret)
                .await
            {
                Ok(()) => {
                    info!(tag = %spec.tag, endpoint = spec.endpoint(), attempts, "Job fired");
                    return Ok(FireReport {
                        tag: spec.tag.clone(),
                        endpoint: spec.endpoint(),
                        attempts,
                    });
                }
                Err(e) => e,
            };

            match self.policy.should_retry(attempts, &error) {
                RetryDecision::Retry(delay) => {
                    warn!(
                        tag = %spec.tag,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Trigger call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    warn!(tag = %spec.tag, attempts, error = %error, "Trigger call failed");
                    let surfaced = if error.is_transient() {
                        TriggerError::Exhausted {
                            attempts,
                            last: error.to_string(),
                        }
                    } else {
                        error
                    };
                    return Err(surfaced.into());
                }
            }
        }
    }
}
