//! Client configuration handling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::store::StoreBackend;

/// Environment variable overriding [`ClientConfig::base_url`].
pub const API_URL_ENV: &str = "PRISM_API_URL";

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const CONFIG_FILE: &str = "client.toml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend root, e.g. `http://localhost:8000`.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Where the credential pair is kept.
    pub store: StoreBackend,

    /// Credential file for [`StoreBackend::File`].
    pub credentials_path: PathBuf,

    /// Logging level.
    pub log_level: String,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let credentials_path = project_dirs()
            .map(|d| d.data_dir().join("credentials.json"))
            .unwrap_or_else(|| PathBuf::from(".prism/credentials.json"));

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            store: StoreBackend::default(),
            credentials_path,
            log_level: "warn".to_string(),
            config_path: PathBuf::new(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the default location, or defaults if absent.
    ///
    /// `PRISM_API_URL` overrides the configured base URL.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_config_path();
        let mut config = Self::load_from(&path)?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        Ok(config)
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            Self::default()
        };

        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// The base URL, validated.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Path of `client.toml` in the platform config directory.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from("prism-client.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "prism", "prism")
}
