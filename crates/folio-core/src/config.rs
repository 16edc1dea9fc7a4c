//! Application configuration management.
//!
//! Configuration is stored at `~/.config/folio/config.json`. Every field
//! has a default, so a missing or partial file is fine. `FOLIO_API_URL`
//! overrides the API base URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_CREDENTIAL_COOKIE;
use crate::guard::{RouteGuard, DEFAULT_ENTRY_ROUTE, DEFAULT_HOME_ROUTE, DEFAULT_PROTECTED_PREFIX};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "folio";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_url`
pub const API_URL_ENV: &str = "FOLIO_API_URL";

const DEFAULT_API_URL: &str = "http://localhost:4000/api";

/// Where the bearer credential is kept between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub credential_cookie: String,
    pub credential_backend: CredentialBackend,
    pub protected_prefix: String,
    pub entry_route: String,
    pub home_route: String,
    /// Unset means the HTTP client's own default
    pub request_timeout_secs: Option<u64>,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            credential_cookie: DEFAULT_CREDENTIAL_COOKIE.to_string(),
            credential_backend: CredentialBackend::default(),
            protected_prefix: DEFAULT_PROTECTED_PREFIX.to_string(),
            entry_route: DEFAULT_ENTRY_ROUTE.to_string(),
            home_route: DEFAULT_HOME_ROUTE.to_string(),
            request_timeout_secs: None,
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(&self.protected_prefix, &self.entry_route, &self.home_route)
    }
}
