//! Shared fixture: real SQLite file plus file-backed adapters in a temp dir

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use hottub_core::application::{CycleCoordinator, CyclePorts};
use hottub_core::port::id_provider::UuidProvider;
use hottub_core::port::time_provider::mocks::FixedTimeProvider;
use hottub_core::port::SecretStore;
use hottub_core::EngineConfig;
use hottub_infra_sqlite::{create_pool, run_migrations, SqliteEventStore};
use hottub_infra_system::{FileArtifactStore, FileSecretStore, SpoolTriggerRegistry};
use tempfile::TempDir;

/// 2023-11-14T22:13:20Z
pub const NOW: i64 = 1_700_000_000_000;

pub struct Stack {
    pub dir: TempDir,
    pub clock: Arc<FixedTimeProvider>,
}

impl Stack {
    pub async fn new() -> Self {
        let stack = Self {
            dir: tempfile::tempdir().unwrap(),
            clock: Arc::new(FixedTimeProvider::new(NOW)),
        };
        stack.secrets().initialize().await.unwrap();
        stack
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.path("events.db").display())
    }

    pub fn secrets(&self) -> Arc<FileSecretStore> {
        Arc::new(FileSecretStore::new(
            self.path("hottub.secret"),
            self.path("secret-audit.log"),
            self.clock.clone(),
        ))
    }

    pub fn artifacts(&self) -> Arc<FileArtifactStore> {
        Arc::new(FileArtifactStore::new(self.path("jobs")))
    }

    pub fn registry(&self) -> Arc<SpoolTriggerRegistry> {
        Arc::new(SpoolTriggerRegistry::new(self.path("spool")))
    }

    /// Fresh pool and store, as a separate short-lived invocation would open
    pub async fn store(&self) -> Arc<SqliteEventStore> {
        let pool = create_pool(&self.database_url(), Duration::from_secs(5))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        Arc::new(SqliteEventStore::new(pool, self.clock.clone()))
    }

    /// One coordinator over its own connection pool
    pub async fn coordinator(&self) -> CycleCoordinator {
        let store = self.store().await;
        let ports = CyclePorts {
            store: store.clone(),
            tx_store: store,
            secrets: self.secrets(),
            artifacts: self.artifacts(),
            registry: self.registry(),
            id_provider: Arc::new(UuidProvider),
            time_provider: self.clock.clone(),
        };
        CycleCoordinator::new(ports, &EngineConfig::default()).unwrap()
    }

    /// Job artifacts currently on disk
    pub fn artifact_count(&self) -> usize {
        match std::fs::read_dir(self.path("jobs")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}
