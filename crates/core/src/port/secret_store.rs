// Secret Store Port (Interface)

use crate::domain::{Secret, SecretRef};
use crate::error::Result;
use async_trait::async_trait;

/// Owner of the shared secret that authenticates job callbacks
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Generate and persist a fresh secret, backing up any existing value
    async fn generate(&self) -> Result<Secret>;

    /// Current secret.
    ///
    /// Fails with `NotFound` when uninitialized and `Corrupt` when the stored
    /// value does not pass the format check.
    async fn current(&self) -> Result<Secret>;

    /// Constant-time check of a candidate against the current secret
    async fn verify(&self, candidate: &str) -> Result<bool> {
        Ok(self.current().await?.matches(candidate))
    }

    /// Back up then replace. Returns (previous, new).
    async fn rotate(&self) -> Result<(Option<Secret>, Secret)>;

    /// Return the existing valid secret, or generate one
    async fn initialize(&self) -> Result<Secret>;

    /// Indirection that a trigger resolves to the current value at fire time
    fn reference(&self) -> SecretRef;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::{Arc, Mutex};

    /// In-memory secret store. Tracks rotations for assertions.
    #[derive(Clone, Default)]
    pub struct InMemorySecretStore {
        current: Arc<Mutex<Option<Secret>>>,
        backups: Arc<Mutex<Vec<Secret>>>,
    }

    impl InMemorySecretStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store pre-initialized with a fresh secret
        pub fn initialized() -> Self {
            let store = Self::new();
            *store.current.lock().unwrap() = Some(Secret::generate());
            store
        }

        pub fn backups(&self) -> Vec<Secret> {
            self.backups.lock().unwrap().clone()
        }

        fn replace(&self) -> (Option<Secret>, Secret) {
            let fresh = Secret::generate();
            let previous = self.current.lock().unwrap().replace(fresh.clone());
            if let Some(old) = &previous {
                self.backups.lock().unwrap().push(old.clone());
            }
            (previous, fresh)
        }
    }

    #[async_trait]
    impl SecretStore for InMemorySecretStore {
        async fn generate(&self) -> Result<Secret> {
            Ok(self.replace().1)
        }

        async fn current(&self) -> Result<Secret> {
            self.current
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| AppError::NotFound("secret not initialized".to_string()))
        }

        async fn rotate(&self) -> Result<(Option<Secret>, Secret)> {
            Ok(self.replace())
        }

        async fn initialize(&self) -> Result<Secret> {
            if let Some(existing) = self.current.lock().unwrap().clone() {
                return Ok(existing);
            }
            self.generate().await
        }

        fn reference(&self) -> SecretRef {
            SecretRef::new("memory://secret")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::InMemorySecretStore;
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_current_not_found_until_initialized() {
        let store = InMemorySecretStore::new();
        assert!(matches!(store.current().await, Err(AppError::NotFound(_))));
        assert!(matches!(
            store.verify("anything").await,
            Err(AppError::NotFound(_))
        ));

        let first = tokio_test::assert_ok!(store.initialize().await);
        let again = tokio_test::assert_ok!(store.initialize().await);
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn test_verify_after_rotate() {
        let store = InMemorySecretStore::initialized();
        let before = store.current().await.unwrap();
        assert!(store.verify(before.expose()).await.unwrap());
        assert!(!store.verify("hts_v1_wrong").await.unwrap());

        let (old, new) = store.rotate().await.unwrap();
        assert_eq!(old.as_ref(), Some(&before));
        assert!(!store.verify(before.expose()).await.unwrap());
        assert!(store.verify(new.expose()).await.unwrap());
        assert_eq!(store.backups(), vec![before]);
    }
}
