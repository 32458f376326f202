//! The access/refresh credential pair and its persistence.
//!
//! A [`CredentialPair`] is always complete: both tokens or nothing. The
//! [`CredentialStore`] maps it onto two fixed keys of a [`SecretStore`] and
//! refuses to hand back half a pair.

use std::sync::Arc;

use crate::store::{Secret, SecretStore, StoreError};

/// Storage key of the access credential.
pub const ACCESS_TOKEN_KEY: &str = "prism/access_token";

/// Storage key of the refresh credential.
pub const REFRESH_TOKEN_KEY: &str = "prism/refresh_token";

/// A short-lived access token together with the refresh token that renews it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    access_token: Secret,
    refresh_token: Secret,
}

impl CredentialPair {
    /// Create a pair from raw token strings.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            refresh_token: Secret::new(refresh_token),
        }
    }

    /// The access credential.
    pub fn access_token(&self) -> &Secret {
        &self.access_token
    }

    /// The refresh credential.
    pub fn refresh_token(&self) -> &Secret {
        &self.refresh_token
    }

    /// Replace the access token, keeping the refresh token unless a rotated
    /// one is supplied.
    pub fn renewed(&self, access_token: impl Into<String>, rotated: Option<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            refresh_token: rotated
                .map(Secret::new)
                .unwrap_or_else(|| self.refresh_token.clone()),
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> Secret {
        Secret::new(format!("Bearer {}", self.access_token.expose()))
    }
}

/// Persists a [`CredentialPair`] under [`ACCESS_TOKEN_KEY`] and
/// [`REFRESH_TOKEN_KEY`].
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn SecretStore>,
}

impl CredentialStore {
    /// Wrap a secret store backend.
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Read the persisted pair.
    ///
    /// A half-present pair is treated as absent and wiped.
    pub async fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        let access = self.store.get(ACCESS_TOKEN_KEY).await?;
        let refresh = self.store.get(REFRESH_TOKEN_KEY).await?;

        match (access, refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(Some(CredentialPair {
                    access_token: access,
                    refresh_token: refresh,
                }))
            }
            (None, None) => Ok(None),
            _ => {
                tracing::warn!("Discarding incomplete stored credential pair");
                self.clear().await?;
                Ok(None)
            }
        }
    }

    /// Persist both tokens.
    ///
    /// If the second write fails, both keys are removed so that no partial
    /// pair survives.
    pub async fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        self.store.set(ACCESS_TOKEN_KEY, &pair.access_token).await?;
        if let Err(e) = self.store.set(REFRESH_TOKEN_KEY, &pair.refresh_token).await {
            let _ = self.clear().await;
            return Err(e);
        }
        Ok(())
    }

    /// Remove both tokens. Both deletes are attempted even if the first fails.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let access = self.store.delete(ACCESS_TOKEN_KEY).await;
        let refresh = self.store.delete(REFRESH_TOKEN_KEY).await;
        access.and(refresh)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn memory() -> (Arc<MemoryStore>, CredentialStore) {
        let backend = Arc::new(MemoryStore::new());
        let store = CredentialStore::new(backend.clone());
        (backend, store)
    }

    #[test]
    fn test_renewed_keeps_refresh_token() {
        let pair = CredentialPair::new("a1", "r1");

        let renewed = pair.renewed("a2", None);
        assert_eq!(renewed.access_token().expose(), "a2");
        assert_eq!(renewed.refresh_token().expose(), "r1");

        let rotated = pair.renewed("a3", Some("r2".to_string()));
        assert_eq!(rotated.refresh_token().expose(), "r2");
    }

    #[test]
    fn test_authorization_header() {
        let pair = CredentialPair::new("abc", "r");
        assert_eq!(pair.authorization_header().expose(), "Bearer abc");
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_, store) = memory();
        store.save(&CredentialPair::new("a1", "r1")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, CredentialPair::new("a1", "r1"));
    }

    #[tokio::test]
    async fn test_load_empty() {
        let (_, store) = memory();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_pair_is_discarded() {
        let (backend, store) = memory();
        backend
            .set(ACCESS_TOKEN_KEY, &Secret::new("orphan"))
            .await
            .unwrap();

        assert!(store.load().await.unwrap().is_none());
        assert!(backend.get(ACCESS_TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let (backend, store) = memory();
        store.save(&CredentialPair::new("a1", "r1")).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(backend.is_empty());
    }
}
