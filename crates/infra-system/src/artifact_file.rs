// File-backed JobArtifactStore
//
// One JSON document per job, named after its tag, read back by the firing
// side to learn endpoint and parameters.

use crate::fs_util::{blocking, write_private_atomic};
use async_trait::async_trait;
use hottub_core::domain::{JobSpec, JobTag, TagNamespace};
use hottub_core::error::{AppError, Result};
use hottub_core::port::JobArtifactStore;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<tag with ':' replaced by '_'>.json`
    pub fn path_for(&self, tag: &JobTag) -> PathBuf {
        self.dir
            .join(format!("{}.json", tag.as_str().replace(':', "_")))
    }

    /// Read a previously written artifact
    pub async fn load(path: impl AsRef<Path>) -> Result<JobSpec> {
        let path = path.as_ref().to_path_buf();
        let raw = blocking(move || match std::fs::read(&path) {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("job artifact {} not found", path.display()),
            )),
            Err(e) => Err(AppError::Io(e)),
        })
        .await?;

        Ok(serde_json::from_slice(&raw)?)
    }
}

#[async_trait]
impl JobArtifactStore for FileArtifactStore {
    async fn write(&self, spec: &JobSpec) -> Result<PathBuf> {
        let path = self.path_for(&spec.tag);
        let mut stored = spec.clone();
        stored.artifact = Some(path.clone());
        let body = serde_json::to_vec_pretty(&stored)?;

        let target = path.clone();
        blocking(move || {
            write_private_atomic(&target, &body)?;
            Ok(())
        })
        .await?;

        debug!(tag = %spec.tag, path = %path.display(), "Job artifact written");
        Ok(path)
    }

    async fn remove(&self, spec: &JobSpec) -> Result<()> {
        let path = spec
            .artifact
            .clone()
            .unwrap_or_else(|| self.path_for(&spec.tag));
        remove_if_present(path).await
    }

    async fn remove_tag(&self, tag: &JobTag) -> Result<()> {
        remove_if_present(self.path_for(tag)).await
    }

    async fn remove_namespace(&self, namespace: TagNamespace) -> Result<u64> {
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
                if !(name.starts_with(&prefix) && name.ends_with(".json")) {
                    continue;
                }
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(AppError::Io(e)),
                }
            }
            Ok(removed)
        })
        .await?;

        info!(namespace = namespace.marker(), removed, "Job artifacts swept");
        Ok(removed)
    }
}

async fn remove_if_present(path: PathBuf) -> Result<()> {
    blocking(move || match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::Io(e)),
    })
    .await
}
