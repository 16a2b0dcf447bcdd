// Spool-directory TriggerRegistry
//
// Each registration is one JSON file in a spool directory. An external timer
// service watches the directory and fires the job at `fire_at`.

use crate::fs_util::{blocking, write_private_atomic};
use async_trait::async_trait;
use hottub_core::domain::{JobSpec, JobTag, TagNamespace};
use hottub_core::error::{AppError, Result};
use hottub_core::port::{TriggerRegistration, TriggerRegistry};
use std::path::PathBuf;
use tracing::{debug, info};

pub struct SpoolTriggerRegistry {
    dir: PathBuf,
}

impl SpoolTriggerRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(tag: &str) -> String {
        format!("{}.json", tag.replace(':', "_"))
    }

    fn path_for(&self, tag: &JobTag) -> PathBuf {
        self.dir.join(Self::file_name(tag.as_str()))
    }

    /// Every registration currently in the spool, ordered by fire time
    pub async fn list(&self) -> Result<Vec<TriggerRegistration>> {
        let dir = self.dir.clone();
        let mut registrations = blocking(move || {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(AppError::Io(e)),
            };

            let mut registrations = Vec::new();
            for entry in entries {
                let path = entry?.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    continue;
                }
                let raw = std::fs::read(&path)?;
                let registration: TriggerRegistration = serde_json::from_slice(&raw)
                    .map_err(|e| {
                        AppError::Corrupt(format!("registration {}: {}", path.display(), e))
                    })?;
                registrations.push(registration);
            }
            Ok(registrations)
        })
        .await?;

        registrations.sort_by(|a, b| {
            a.fire_at
                .cmp(&b.fire_at)
                .then_with(|| a.tag.as_str().cmp(b.tag.as_str()))
        });
        Ok(registrations)
    }
}

#[async_trait]
impl TriggerRegistry for SpoolTriggerRegistry {
    async fn register(&self, spec: &JobSpec) -> Result<()> {
        let registration = TriggerRegistration::from_spec(spec);
        let body = serde_json::to_vec_pretty(&registration)?;
        let path = self.path_for(&spec.tag);

        blocking(move || {
            write_private_atomic(&path, &body)?;
            Ok(())
        })
        .await?;

        info!(
            tag = %spec.tag,
            fire_at = spec.fire_at,
            cron = %registration.cron_expression,
            "Trigger registered"
        );
        Ok(())
    }

    async fn unregister(&self, tag: &JobTag) -> Result<bool> {
        let path = self.path_for(tag);
        let removed = blocking(move || match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        })
        .await?;

        debug!(tag = %tag, removed, "Trigger unregistered");
        Ok(removed)
    }

    async fn unregister_namespace(&self, namespace: TagNamespace) -> Result<u64> {
        let dir = self.dir.clone();
        let prefix = namespace.prefix().replace(':', "_");

        let removed = blocking(move || {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
                Err(e) => return Err(AppError::Io(e)),
            };

            let mut removed = 0u64;
            for entry in entries {
                let entry = entry?;
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if name.starts_with(&prefix) && name.ends_with(".json") {
                    match std::fs::remove_file(entry.path()) {
                        Ok(()) => removed += 1,
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => return Err(AppError::Io(e)),
                    }
                }
            }
            Ok(removed)
        })
        .await?;

        info!(namespace = namespace.marker(), removed, "Trigger namespace swept");
        Ok(removed)
    }
}
