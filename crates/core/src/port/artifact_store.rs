// Job Artifact Port - ephemeral parameter files read by the trigger at fire time

use crate::domain::{JobSpec, JobTag, TagNamespace};
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait JobArtifactStore: Send + Sync {
    /// Write the job spec and return where it was written
    async fn write(&self, spec: &JobSpec) -> Result<PathBuf>;

    /// Remove the job's artifact. Missing artifacts are not an error.
    async fn remove(&self, spec: &JobSpec) -> Result<()>;

    /// Remove the artifact written for `tag`, if any
    async fn remove_tag(&self, tag: &JobTag) -> Result<()>;

    /// Remove every artifact in a namespace; returns how many were removed
    async fn remove_namespace(&self, namespace: TagNamespace) -> Result<u64>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Keeps artifacts in a map keyed by tag
    #[derive(Clone, Default)]
    pub struct InMemoryArtifactStore {
        artifacts: Arc<Mutex<BTreeMap<String, JobSpec>>>,
        fail_writes: Arc<AtomicBool>,
    }

    impl InMemoryArtifactStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn tags(&self) -> Vec<String> {
            self.artifacts.lock().unwrap().keys().cloned().collect()
        }

        pub fn get(&self, tag: &str) -> Option<JobSpec> {
            self.artifacts.lock().unwrap().get(tag).cloned()
        }
    }

    #[async_trait]
    impl JobArtifactStore for InMemoryArtifactStore {
        async fn write(&self, spec: &JobSpec) -> Result<PathBuf> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "injected artifact failure",
                )));
            }
            let path = PathBuf::from(format!("memory://{}", spec.tag));
            self.artifacts
                .lock()
                .unwrap()
                .insert(spec.tag.to_string(), spec.clone());
            Ok(path)
        }

        async fn remove(&self, spec: &JobSpec) -> Result<()> {
            self.remove_tag(&spec.tag).await
        }

        async fn remove_tag(&self, tag: &JobTag) -> Result<()> {
            self.artifacts.lock().unwrap().remove(tag.as_str());
            Ok(())
        }

        async fn remove_namespace(&self, namespace: TagNamespace) -> Result<u64> {
            let prefix = namespace.prefix();
            let mut artifacts = self.artifacts.lock().unwrap();
            let before = artifacts.len();
            artifacts.retain(|tag, _| !tag.starts_with(&prefix));
            Ok((before - artifacts.len()) as u64)
        }
    }
}
