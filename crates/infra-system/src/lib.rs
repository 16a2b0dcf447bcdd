// Hot Tub Infrastructure - System Adapters
// Implements: SecretStore, JobArtifactStore, TriggerRegistry, TriggerTransport

mod artifact_file;
mod command_transport;
mod fs_util;
mod secret_file;
mod spool_registry;

pub use artifact_file::FileArtifactStore;
pub use command_transport::{CommandTransport, DEFAULT_ENV_ALLOWLIST, EXIT_TEMPFAIL};
pub use secret_file::FileSecretStore;
pub use spool_registry::SpoolTriggerRegistry;
