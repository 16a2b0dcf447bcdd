// Trigger Ports - registration of timed jobs and the fire-time call
//
// The registry is what an external time-triggered environment reads to know
// when to fire. The transport performs the authenticated call when it does.

use crate::domain::event::cron_expression_for;
use crate::domain::{JobSpec, JobTag, Secret, TagNamespace};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Trigger invocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// Worth retrying (timeouts, temporary unavailability)
    #[error("Transient trigger failure: {0}")]
    Transient(String),

    #[error("Permanent trigger failure: {0}")]
    Permanent(String),

    #[error("Trigger failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl TriggerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TriggerError::Transient(_))
    }
}

/// What an external timer needs to fire one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRegistration {
    pub tag: JobTag,
    pub endpoint: String,
    pub fire_at: i64,
    pub cron_expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl TriggerRegistration {
    pub fn from_spec(spec: &JobSpec) -> Self {
        Self {
            tag: spec.tag.clone(),
            endpoint: spec.endpoint().to_string(),
            fire_at: spec.fire_at,
            cron_expression: cron_expression_for(spec.fire_at),
            artifact: spec.artifact.clone(),
        }
    }
}

/// Trigger registry interface
#[async_trait]
pub trait TriggerRegistry: Send + Sync {
    /// Register (or replace) the timed job for `spec.tag`
    async fn register(&self, spec: &JobSpec) -> Result<()>;

    /// Remove one registration. Returns false if it was not registered.
    async fn unregister(&self, tag: &JobTag) -> Result<bool>;

    /// Remove every registration in a namespace. Returns how many were removed.
    async fn unregister_namespace(&self, namespace: TagNamespace) -> Result<u64>;
}

/// Fire-time call of one named operation
#[async_trait]
pub trait TriggerTransport: Send + Sync {
    async fn invoke(
        &self,
        endpoint: &str,
        parameters: &BTreeMap<String, String>,
        secret: &Secret,
    ) -> std::result::Result<(), TriggerError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Registry kept in a map keyed by tag
    #[derive(Clone, Default)]
    pub struct InMemoryTriggerRegistry {
        registrations: Arc<Mutex<BTreeMap<String, TriggerRegistration>>>,
        fail_register: Arc<AtomicBool>,
    }

    impl InMemoryTriggerRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_register(&self, fail: bool) {
            self.fail_register.store(fail, Ordering::SeqCst);
        }

        pub fn is_registered(&self, tag: &str) -> bool {
            self.registrations.lock().unwrap().contains_key(tag)
        }

        pub fn tags(&self) -> Vec<String> {
            self.registrations.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl TriggerRegistry for InMemoryTriggerRegistry {
        async fn register(&self, spec: &JobSpec) -> Result<()> {
            if self.fail_register.load(Ordering::SeqCst) {
                return Err(AppError::Trigger(TriggerError::Permanent(
                    "injected registration failure".to_string(),
                )));
            }
            self.registrations
                .lock()
                .unwrap()
                .insert(spec.tag.to_string(), TriggerRegistration::from_spec(spec));
            Ok(())
        }

        async fn unregister(&self, tag: &JobTag) -> Result<bool> {
            Ok(self
                .registrations
                .lock()
                .unwrap()
                .remove(tag.as_str())
                .is_some())
        }

        async fn unregister_namespace(&self, namespace: TagNamespace) -> Result<u64> {
            let prefix = namespace.prefix();
            let mut registrations = self.registrations.lock().unwrap();
            let before = registrations.len();
            registrations.retain(|tag, _| !tag.starts_with(&prefix));
            Ok((before - registrations.len()) as u64)
        }
    }

    /// One recorded transport call
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub endpoint: String,
        pub parameters: BTreeMap<String, String>,
        pub auth: String,
    }

    /// Transport that replays scripted outcomes, then succeeds
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        outcomes: Arc<Mutex<VecDeque<std::result::Result<(), TriggerError>>>>,
        calls: Arc<Mutex<Vec<RecordedCall>>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_outcomes(
            outcomes: impl IntoIterator<Item = std::result::Result<(), TriggerError>>,
        ) -> Self {
            let transport = Self::new();
            transport.outcomes.lock().unwrap().extend(outcomes);
            transport
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TriggerTransport for ScriptedTransport {
        async fn invoke(
            &self,
            endpoint: &str,
            parameters: &BTreeMap<String, String>,
            secret: &Secret,
        ) -> std::result::Result<(), TriggerError> {
            self.calls.lock().unwrap().push(RecordedCall {
                endpoint: endpoint.to_string(),
                parameters: parameters.clone(),
                auth: secret.expose().to_string(),
            });
            self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }
}
