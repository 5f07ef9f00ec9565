//! Gateway admin API configuration

use crate::{Result, SyncerError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Key in [`GatewayConfig::config`] holding the admin API key
pub const API_KEY: &str = "X-API-KEY";

/// Configuration for one gateway admin endpoint
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GatewayConfig {
    /// Base URL of the admin API, e.g. `http://127.0.0.1:9080`
    pub admin_url: String,

    /// Path prefix placed between the base URL and the resource path
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Extra gateway settings; `X-API-KEY` carries the admin key
    #[serde(default)]
    pub config: BTreeMap<String, String>,

    /// Timeout applied to every admin call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Where exported snapshots are written
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Resource kinds to export, by admin path or snapshot field name.
    /// Every kind is exported when unset.
    #[serde(default)]
    pub export_kinds: Option<Vec<String>>,
}

fn default_prefix() -> String {
    "/apisix/admin/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl GatewayConfig {
    pub fn new(admin_url: impl Into<String>) -> Self {
        Self {
            admin_url: admin_url.into(),
            prefix: default_prefix(),
            config: BTreeMap::new(),
            timeout_secs: default_timeout_secs(),
            snapshot_path: None,
            export_kinds: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.insert(API_KEY.to_string(), key.into());
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_export_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.export_kinds = Some(kinds.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&yaml)?;
        info!("Gateway configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let admin_url = std::env::var("SYNCER_ADMIN_URL").map_err(|_| {
            SyncerError::InvalidConfiguration("SYNCER_ADMIN_URL is not set".to_string())
        })?;

        let mut config = Self::new(admin_url);
        if let Ok(prefix) = std::env::var("SYNCER_ADMIN_PREFIX") {
            config = config.with_prefix(prefix);
        }
        if let Ok(key) = std::env::var("SYNCER_API_KEY") {
            config = config.with_api_key(key);
        }
        if let Ok(path) = std::env::var("SYNCER_SNAPSHOT_PATH") {
            config = config.with_snapshot_path(path);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.admin_url.trim().is_empty() {
            return Err(SyncerError::InvalidConfiguration(
                "admin-url must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(SyncerError::InvalidConfiguration(
                "timeout-secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Full URL of an admin resource path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}{}", self.admin_url, self.prefix, path)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.config.get(API_KEY).map(String::as_str)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Snapshot destination, defaulting to `apisix.yaml` in the temp directory
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("apisix.yaml"))
    }
}
