// Job Specification - ephemeral, credentialed-by-reference trigger request

use super::error::{DomainError, Result};
use super::secret::SecretRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Prefix shared by every trigger tag issued by this system
pub const TAG_PREFIX: &str = "HOT_TUB_";

/// Tag namespace. Stop jobs live in the monitor namespace so a single
/// monitor sweep removes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagNamespace {
    Start,
    Monitor,
}

impl TagNamespace {
    pub fn marker(&self) -> &'static str {
        match self {
            TagNamespace::Start => "START",
            TagNamespace::Monitor => "MONITOR",
        }
    }

    /// Full prefix matched by bulk sweeps, e.g. `HOT_TUB_MONITOR:`
    pub fn prefix(&self) -> String {
        format!("{}{}:", TAG_PREFIX, self.marker())
    }
}

/// Stable identifier of a trigger registration: `HOT_TUB_{NS}:{id}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobTag(String);

impl JobTag {
    pub fn new(namespace: TagNamespace, id: &str) -> Self {
        Self(format!("{}{}", namespace.prefix(), id))
    }

    /// Parse a tag read back from a registry
    pub fn parse(raw: &str) -> Result<Self> {
        [TagNamespace::Start, TagNamespace::Monitor]
            .iter()
            .find_map(|ns| {
                raw.strip_prefix(&ns.prefix())
                    .filter(|id| !id.is_empty())
                    .map(|id| Self::new(*ns, id))
            })
            .ok_or_else(|| DomainError::ValidationError(format!("not a job tag: {raw}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> TagNamespace {
        if self.0.starts_with(&TagNamespace::Start.prefix()) {
            TagNamespace::Start
        } else {
            TagNamespace::Monitor
        }
    }

    /// The id portion after the namespace prefix
    pub fn id(&self) -> &str {
        self.0
            .split_once(':')
            .map(|(_, id)| id)
            .unwrap_or_default()
    }
}

impl std::fmt::Display for JobTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three externally callable operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    StartHeating,
    MonitorTemp,
    StopHeating,
}

impl JobKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            JobKind::StartHeating => "start-heating",
            JobKind::MonitorTemp => "monitor-temp",
            JobKind::StopHeating => "stop-heating",
        }
    }

    pub fn namespace(&self) -> TagNamespace {
        match self {
            JobKind::StartHeating => TagNamespace::Start,
            JobKind::MonitorTemp | JobKind::StopHeating => TagNamespace::Monitor,
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Parameterized job for one named operation.
///
/// Carries a [`SecretRef`], never the secret itself. Serialized as-is into
/// the ephemeral artifact the trigger reads at fire time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub kind: JobKind,
    pub tag: JobTag,
    pub parameters: BTreeMap<String, String>,
    pub auth: SecretRef,
    pub fire_at: i64, // epoch ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl JobSpec {
    pub fn endpoint(&self) -> &'static str {
        self.kind.endpoint()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}
