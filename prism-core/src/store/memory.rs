//! Process-local secret storage.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Secret, SecretStore, StoreError};

/// Secret store that lives only as long as the process.
///
/// Backs `--store memory` sessions and tests. Clones of the `Arc` around it
/// share one map.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Secret>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with a pair left over from an earlier session.
    pub fn with_data(data: impl IntoIterator<Item = (String, Secret)>) -> Self {
        Self {
            data: RwLock::new(data.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys_count", &self.len())
            .finish()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        self.data.write().insert(key.to_string(), secret.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.data.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();

        store.set(ACCESS_TOKEN_KEY, &Secret::new("a1")).await.unwrap();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap().unwrap().expose(), "a1");
        assert!(store.get(REFRESH_TOKEN_KEY).await.unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set(REFRESH_TOKEN_KEY, &Secret::new("r1")).await.unwrap();

        store.delete(REFRESH_TOKEN_KEY).await.unwrap();
        store.delete(REFRESH_TOKEN_KEY).await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_seeded_pair_is_visible() {
        let store = MemoryStore::with_data([
            (ACCESS_TOKEN_KEY.to_string(), Secret::new("a1")),
            (REFRESH_TOKEN_KEY.to_string(), Secret::new("r1")),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap().unwrap().expose(), "r1");
    }
}
