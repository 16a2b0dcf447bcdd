// Job Spec Builder - validated, tagged, credentialed-by-reference jobs

use crate::domain::safety::{validate_identifier, validate_reason, validate_target_temp};
use crate::domain::{JobKind, JobSpec, JobTag};
use crate::error::{AppError, Result};
use crate::port::{JobArtifactStore, SecretStore};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Builds the three job kinds and writes their ephemeral artifacts
pub struct JobSpecBuilder {
    secrets: Arc<dyn SecretStore>,
    artifacts: Arc<dyn JobArtifactStore>,
}

impl JobSpecBuilder {
    pub fn new(secrets: Arc<dyn SecretStore>, artifacts: Arc<dyn JobArtifactStore>) -> Self {
        Self { secrets, artifacts }
    }

    /// `start-heating(id, target_temp, scheduled_time)` tagged `HOT_TUB_START:{event_id}`
    pub async fn build_start_job(
        &self,
        event_id: &str,
        target_temp: f64,
        scheduled_time: i64,
    ) -> Result<JobSpec> {
        validate_identifier("event_id", event_id)?;
        validate_target_temp(target_temp)?;

        let parameters = BTreeMap::from([
            ("id".to_string(), event_id.to_string()),
            ("target_temp".to_string(), target_temp.to_string()),
            ("scheduled_time".to_string(), rfc3339(scheduled_time)?),
        ]);

        self.finish(JobKind::StartHeating, event_id, parameters, scheduled_time)
            .await
    }

    /// `monitor-temp(cycle_id, monitor_id, check_time)` tagged `HOT_TUB_MONITOR:{monitor_id}`
    pub async fn build_monitor_job(
        &self,
        cycle_id: &str,
        monitor_id: &str,
        check_time: i64,
    ) -> Result<JobSpec> {
        validate_identifier("cycle_id", cycle_id)?;
        validate_identifier("monitor_id", monitor_id)?;

        let parameters = BTreeMap::from([
            ("cycle_id".to_string(), cycle_id.to_string()),
            ("monitor_id".to_string(), monitor_id.to_string()),
            ("check_time".to_string(), rfc3339(check_time)?),
        ]);

        self.finish(JobKind::MonitorTemp, monitor_id, parameters, check_time)
            .await
    }

    /// `stop-heating(cycle_id, reason)` tagged in the monitor namespace
    pub async fn build_stop_job(
        &self,
        cycle_id: &str,
        stop_id: &str,
        reason: &str,
        fire_at: i64,
    ) -> Result<JobSpec> {
        validate_identifier("cycle_id", cycle_id)?;
        validate_identifier("stop_id", stop_id)?;
        validate_reason(reason)?;
        rfc3339(fire_at)?;

        let parameters = BTreeMap::from([
            ("cycle_id".to_string(), cycle_id.to_string()),
            ("reason".to_string(), reason.to_string()),
        ]);

        self.finish(JobKind::StopHeating, stop_id, parameters, fire_at)
            .await
    }

    /// Remove the job's artifact. Safe to call repeatedly.
    pub async fn cleanup(&self, spec: &JobSpec) -> Result<()> {
        self.artifacts.remove(spec).await?;
        debug!(tag = %spec.tag, "Job artifact removed");
        Ok(())
    }

    async fn finish(
        &self,
        kind: JobKind,
        id: &str,
        parameters: BTreeMap<String, String>,
        fire_at: i64,
    ) -> Result<JobSpec> {
        // Jobs are only issued once a secret exists; the job itself carries a reference
        self.secrets.current().await?;

        let mut spec = JobSpec {
            kind,
            tag: JobTag::new(kind.namespace(), id),
            parameters,
            auth: self.secrets.reference(),
            fire_at,
            artifact: None,
        };

        let path = self.artifacts.write(&spec).await?;
        spec.artifact = Some(path);

        debug!(tag = %spec.tag, endpoint = %kind, fire_at, "Job spec built");
        Ok(spec)
    }
}

/// RFC 3339 UTC rendering of an epoch-ms instant
pub fn rfc3339(epoch_millis: i64) -> Result<String> {
    DateTime::<Utc>::from_timestamp_millis(epoch_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| AppError::InvalidArgument(format!("timestamp out of range: {}", epoch_millis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::artifact_store::mocks::InMemoryArtifactStore;
    use crate::port::secret_store::mocks::InMemorySecretStore;

    const NOW: i64 = 1_700_000_000_000;

    fn builder() -> (JobSpecBuilder, InMemoryArtifactStore) {
        let artifacts = InMemoryArtifactStore::new();
        let builder = JobSpecBuilder::new(
            Arc::new(InMemorySecretStore::initialized()),
            Arc::new(artifacts.clone()),
        );
        (builder, artifacts)
    }

    #[tokio::test]
    async fn test_start_job_shape() {
        let (builder, artifacts) = builder();
        let spec = builder.build_start_job("evt-100", 102.0, NOW).await.unwrap();

        assert_eq!(spec.tag.as_str(), "HOT_TUB_START:evt-100");
        assert_eq!(spec.endpoint(), "start-heating");
        assert_eq!(spec.param("id"), Some("evt-100"));
        assert_eq!(spec.param("target_temp"), Some("102"));
        assert_eq!(spec.param("scheduled_time"), Some("2023-11-14T22:13:20.000Z"));
        assert_eq!(spec.auth.as_str(), "memory://secret");
        assert!(spec.artifact.is_some());
        assert_eq!(artifacts.tags(), vec!["HOT_TUB_START:evt-100".to_string()]);
    }

    #[tokio::test]
    async fn test_monitor_and_stop_share_namespace() {
        let (builder, _) = builder();
        let monitor = builder
            .build_monitor_job("cycle-1", "mon-1", NOW)
            .await
            .unwrap();
        let stop = builder
            .build_stop_job("cycle-1", "stop-1", "target temperature reached", NOW)
            .await
            .unwrap();

        assert_eq!(monitor.tag.as_str(), "HOT_TUB_MONITOR:mon-1");
        assert_eq!(monitor.param("check_time"), Some("2023-11-14T22:13:20.000Z"));
        assert_eq!(stop.tag.as_str(), "HOT_TUB_MONITOR:stop-1");
        assert_eq!(stop.endpoint(), "stop-heating");
        assert_eq!(stop.param("reason"), Some("target temperature reached"));
    }

    #[tokio::test]
    async fn test_invalid_identifiers_build_nothing() {
        let (builder, artifacts) = builder();
        let too_long = "a".repeat(51);
        for bad in ["ab", too_long.as_str(), "has space"] {
            let err = builder.build_start_job(bad, 100.0, NOW).await.unwrap_err();
            assert!(err.is_invalid_argument(), "{bad:?} -> {err}");
        }
        let err = builder
            .build_monitor_job("cycle-1", "m", NOW)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(artifacts.tags().is_empty());
    }

    #[tokio::test]
    async fn test_temperature_and_reason_bounds() {
        let (builder, artifacts) = builder();
        assert!(builder
            .build_start_job("evt-1", 49.0, NOW)
            .await
            .unwrap_err()
            .is_invalid_argument());
        assert!(builder
            .build_start_job("evt-1", 111.0, NOW)
            .await
            .unwrap_err()
            .is_invalid_argument());
        assert!(builder
            .build_stop_job("cycle-1", "stop-1", "", NOW)
            .await
            .unwrap_err()
            .is_invalid_argument());
        assert!(artifacts.tags().is_empty());
    }

    #[tokio::test]
    async fn test_requires_initialized_secret() {
        let artifacts = InMemoryArtifactStore::new();
        let builder = JobSpecBuilder::new(
            Arc::new(InMemorySecretStore::new()),
            Arc::new(artifacts.clone()),
        );
        let err = builder
            .build_start_job("evt-1", 100.0, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(artifacts.tags().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let (builder, artifacts) = builder();
        let spec = builder.build_start_job("evt-1", 100.0, NOW).await.unwrap();
        builder.cleanup(&spec).await.unwrap();
        builder.cleanup(&spec).await.unwrap();
        assert!(artifacts.tags().is_empty());
    }

    #[tokio::test]
    async fn test_regeneration_is_stable() {
        let (builder, _) = builder();
        let a = builder.build_start_job("evt-1", 100.0, NOW).await.unwrap();
        let b = builder.build_start_job("evt-1", 100.0, NOW).await.unwrap();
        assert_eq!(a.tag, b.tag);
        assert_eq!(a.parameters, b.parameters);
    }
}
