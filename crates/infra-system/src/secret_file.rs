// File-backed SecretStore
//
// Single-line secret file, owner-only, replaced atomically. Every mutation
// backs up the previous value and appends a line to the security audit log.

use crate::fs_util::{append_private_line, blocking, write_private_atomic, write_private_unique};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use hottub_core::domain::{Secret, SecretRef};
use hottub_core::error::{AppError, Result};
use hottub_core::port::{SecretStore, TimeProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub struct FileSecretStore {
    path: PathBuf,
    audit_log: PathBuf,
    time_provider: Arc<dyn TimeProvider>,
}

impl FileSecretStore {
    pub fn new(
        path: impl Into<PathBuf>,
        audit_log: impl Into<PathBuf>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            path: path.into(),
            audit_log: audit_log.into(),
            time_provider,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Backup path for a value replaced at `now_millis`. Later backups in
    /// the same millisecond get a `.1`, `.2`, ... suffix.
    fn backup_path(&self, now_millis: i64) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".bak.{}", now_millis));
        PathBuf::from(name)
    }

    /// Copy the current file (valid or not) aside, then write a fresh secret
    async fn replace(&self, action: &'static str) -> Result<Secret> {
        let path = self.path.clone();
        let backup = self.backup_path(self.time_provider.now_millis());
        let fresh = Secret::generate();
        let line = format!("{}\n", fresh.expose());

        let backed_up = blocking(move || {
            let backed_up = match std::fs::read(&path) {
                Ok(previous) => Some(write_private_unique(&backup, &previous)?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => return Err(AppError::Io(e)),
            };
            write_private_atomic(&path, line.as_bytes())?;
            Ok(backed_up)
        })
        .await?;

        if let Some(backup) = &backed_up {
            info!(backup = %backup.display(), "Previous secret backed up");
        }
        info!(path = %self.path.display(), action, "Secret written");
        self.audit(action).await;

        Ok(fresh)
    }

    /// Read and validate the stored secret
    async fn read(&self) -> Result<Secret> {
        let path = self.path.clone();
        let raw = blocking(move || match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("secret not initialized at {}", path.display()),
            )),
            Err(e) => Err(AppError::Io(e)),
        })
        .await?;

        Secret::parse(&raw).map_err(|e| {
            AppError::Corrupt(format!("secret file {}: {}", self.path.display(), e))
        })
    }

    /// Audit failures never fail the operation
    async fn audit(&self, action: &'static str) {
        let line = format!(
            "{} pid={} action={}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            std::process::id(),
            action
        );
        let audit_log = self.audit_log.clone();

        let result = blocking(move || {
            append_private_line(&audit_log, &line)?;
            Ok(())
        })
        .await;

        if let Err(e) = result {
            warn!(audit_log = %self.audit_log.display(), error = %e, "Failed to write secret audit log");
        }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn generate(&self) -> Result<Secret> {
        self.replace("generate").await
    }

    async fn current(&self) -> Result<Secret> {
        self.read().await
    }

    async fn rotate(&self) -> Result<(Option<Secret>, Secret)> {
        let previous = match self.read().await {
            Ok(secret) => Some(secret),
            Err(AppError::NotFound(_)) | Err(AppError::Corrupt(_)) => None,
            Err(e) => return Err(e),
        };
        let fresh = self.replace("rotate").await?;
        Ok((previous, fresh))
    }

    async fn initialize(&self) -> Result<Secret> {
        match self.read().await {
            Ok(existing) => Ok(existing),
            Err(AppError::NotFound(_)) => self.replace("initialize").await,
            Err(AppError::Corrupt(reason)) => {
                warn!(%reason, "Stored secret is corrupt, regenerating");
                self.replace("initialize-regenerate").await
            }
            Err(e) => Err(e),
        }
    }

    fn reference(&self) -> SecretRef {
        SecretRef::new(format!("file://{}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hottub_core::port::time_provider::mocks::FixedTimeProvider;
    use std::fs;

    const NOW: i64 = 1_700_000_000_000;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: FileSecretStore,
        clock: Arc<FixedTimeProvider>,
        audit_log: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let audit_log = dir.path().join("secret-audit.log");
        let clock = Arc::new(FixedTimeProvider::new(NOW));
        let store = FileSecretStore::new(
            dir.path().join("hottub.secret"),
            audit_log.clone(),
            clock.clone(),
        );
        Fixture {
            _dir: dir,
            store,
            clock,
            audit_log,
        }
    }

    #[tokio::test]
    async fn test_current_before_initialize_is_not_found() {
        let f = fixture();
        assert!(matches!(f.store.current().await, Err(AppError::NotFound(_))));
        assert!(matches!(
            f.store.verify("anything").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_initialize_is_stable() {
        let f = fixture();
        let first = f.store.initialize().await.unwrap();
        let second = f.store.initialize().await.unwrap();
        assert_eq!(first, second);

        let raw = fs::read_to_string(f.store.path()).unwrap();
        assert_eq!(raw, format!("{}\n", first.expose()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(f.store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_rotate_backs_up_and_invalidates_old_value() {
        let f = fixture();
        let original = f.store.initialize().await.unwrap();
        assert!(f.store.verify(original.expose()).await.unwrap());
        assert!(!f.store.verify("hts_v1_wrong").await.unwrap());

        f.clock.advance(1_000);
        let (old, new) = f.store.rotate().await.unwrap();
        assert_eq!(old.as_ref(), Some(&original));
        assert!(!f.store.verify(original.expose()).await.unwrap());
        assert!(f.store.verify(new.expose()).await.unwrap());

        let backup = f.store.backup_path(NOW + 1_000);
        assert_eq!(
            fs::read_to_string(backup).unwrap().trim(),
            original.expose()
        );
    }

    #[tokio::test]
    async fn test_rotations_in_same_millisecond_keep_every_backup() {
        let f = fixture();
        let original = f.store.initialize().await.unwrap();
        let (_, second) = f.store.rotate().await.unwrap();
        let (_, third) = f.store.rotate().await.unwrap();
        assert_eq!(f.store.current().await.unwrap(), third);

        let backup = f.store.backup_path(NOW);
        let mut next = backup.clone().into_os_string();
        next.push(".1");
        assert_eq!(
            fs::read_to_string(&backup).unwrap().trim(),
            original.expose()
        );
        assert_eq!(
            fs::read_to_string(PathBuf::from(next)).unwrap().trim(),
            second.expose()
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_then_regenerated() {
        let f = fixture();
        fs::write(f.store.path(), "not-a-secret\n").unwrap();

        assert!(matches!(f.store.current().await, Err(AppError::Corrupt(_))));

        let fresh = f.store.initialize().await.unwrap();
        assert_eq!(f.store.current().await.unwrap(), fresh);
        // The corrupt value was kept aside
        assert_eq!(
            fs::read_to_string(f.store.backup_path(NOW)).unwrap(),
            "not-a-secret\n"
        );
    }

    #[tokio::test]
    async fn test_mutations_are_audited() {
        let f = fixture();
        f.store.initialize().await.unwrap();
        f.store.initialize().await.unwrap();
        f.clock.advance(1);
        f.store.rotate().await.unwrap();

        let audit = fs::read_to_string(&f.audit_log).unwrap();
        let lines: Vec<_> = audit.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("action=initialize"));
        assert!(lines[1].contains(&format!("pid={}", std::process::id())));
        assert!(lines[1].ends_with("action=rotate"));
    }

    #[tokio::test]
    async fn test_unwritable_audit_log_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the audit file should be makes appends fail
        let audit_log = dir.path().join("audit");
        fs::create_dir(&audit_log).unwrap();
        let store = FileSecretStore::new(
            dir.path().join("hottub.secret"),
            audit_log,
            Arc::new(FixedTimeProvider::new(NOW)),
        );

        assert!(store.generate().await.is_ok());
    }

    #[test]
    fn test_reference_names_the_file() {
        let f = fixture();
        assert!(f.store.reference().as_str().starts_with("file://"));
        assert!(f.store.reference().as_str().ends_with("hottub.secret"));
    }
}
