//! Persistent secret storage.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`SecretStore`] - Trait for key-value secret backends
//! - [`MemoryStore`] - In-memory implementation for tests and ephemeral sessions
//! - [`FileStore`] - JSON file in the platform data directory
//! - [`KeyringStore`] - OS keyring implementation (with `keyring-store` feature)
//! - [`create_store`] - Helper to select a backend from configuration
//!
//! The credential pair is the only thing persisted here; see
//! [`CredentialStore`](crate::credential::CredentialStore) for the key layout.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod file;
#[cfg(feature = "keyring-store")]
mod keyring;
mod memory;

pub use file::FileStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;
pub use memory::MemoryStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose) and is
/// wiped from memory when dropped. Debug and Display show `[REDACTED]`.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret holds an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for secret store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The keyring backend is not available.
    #[error("keyring not available: {message}")]
    KeyringUnavailable { message: String },
}

/// Abstraction over persistent key-value secret backends.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Retrieve a secret by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError>;

    /// Store a secret at the given key, overwriting any existing value.
    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError>;

    /// Delete a secret by key.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Which [`SecretStore`] backend to use for the credential pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// OS keyring (falls back to memory when unavailable).
    #[default]
    Keyring,
    /// JSON file on disk.
    File,
    /// Process memory only; nothing survives a restart.
    Memory,
}

/// Create a secret store for the requested backend.
///
/// `file_path` is only consulted for [`StoreBackend::File`]. When the
/// keyring is requested but cannot be opened, or the file store cannot be
/// loaded, this falls back to a [`MemoryStore`] and logs a warning.
pub fn create_store(backend: StoreBackend, file_path: Option<&Path>) -> Arc<dyn SecretStore> {
    match backend {
        StoreBackend::Keyring => {
            #[cfg(feature = "keyring-store")]
            match KeyringStore::try_new("prism") {
                Ok(store) => {
                    tracing::info!("Using OS keyring for credential storage");
                    return Arc::new(store);
                }
                Err(e) => {
                    tracing::warn!(
                        "Keyring unavailable ({}), falling back to memory store. \
                         Sessions will not persist across restarts.",
                        e
                    );
                }
            }

            #[cfg(not(feature = "keyring-store"))]
            tracing::warn!(
                "Keyring storage requested but keyring-store feature not enabled. \
                 Sessions will not persist across restarts."
            );
        }
        StoreBackend::File => match file_path.map(FileStore::open) {
            Some(Ok(store)) => {
                tracing::info!("Using credential file {:?}", store.path());
                return Arc::new(store);
            }
            Some(Err(e)) => {
                tracing::warn!("Credential file unusable ({}), falling back to memory store", e);
            }
            None => {
                tracing::warn!("File store requested without a path, falling back to memory store");
            }
        },
        StoreBackend::Memory => {}
    }

    tracing::debug!("Using in-memory credential storage");
    Arc::new(MemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("super-secret");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_secret_display_redacted() {
        let secret = Secret::new("super-secret");
        let display = format!("{}", secret);
        assert!(!display.contains("super-secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_secret_serializes_transparently() {
        let json = serde_json::to_string(&Secret::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_store_backend_parses_lowercase() {
        let backend: StoreBackend = serde_json::from_str("\"file\"").unwrap();
        assert_eq!(backend, StoreBackend::File);
        assert_eq!(StoreBackend::default(), StoreBackend::Keyring);
    }

    #[tokio::test]
    async fn test_create_store_memory() {
        let store = create_store(StoreBackend::Memory, None);

        store.set("test-key", &Secret::new("test")).await.unwrap();
        let retrieved = store.get("test-key").await.unwrap();
        assert_eq!(retrieved.unwrap().expose(), "test");
    }

    #[tokio::test]
    async fn test_create_store_file_without_path_falls_back() {
        let store = create_store(StoreBackend::File, None);

        store.set("k", &Secret::new("v")).await.unwrap();
        assert!(store.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_store_file_with_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");

        let store = create_store(StoreBackend::File, Some(&path));
        store.set("k", &Secret::new("v")).await.unwrap();

        assert!(path.exists());
    }
}
