use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Keychain service name
const SERVICE_NAME: &str = "folio";

/// Credential file name in cache directory
const CREDENTIAL_FILE: &str = "credential.json";

/// Holder of the bearer token, the client-side equivalent of the
/// session cookie. Read on every request; written only by login,
/// logout, and session expiry.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn store(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;

    fn is_present(&self) -> bool {
        self.token().is_some()
    }
}

/// Process-local credential, lost on exit.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .filter(|t| !t.is_empty())
    }

    fn store(&self, token: &str) -> Result<()> {
        *self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner()) =
            Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialData {
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Credential persisted as JSON in the cache directory, so separate
/// CLI invocations share one session.
pub struct FileCredentialStore {
    cache_dir: PathBuf,
    data: RwLock<Option<CredentialData>>,
}

impl FileCredentialStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: RwLock::new(None),
        }
    }

    /// Open the store, loading any credential already on disk.
    /// An unreadable credential file is discarded and the store starts empty.
    pub fn open(cache_dir: PathBuf) -> Self {
        let store = Self::new(cache_dir);
        if let Err(e) = store.load() {
            warn!(error = %e, "Discarding unreadable credential file");
            if let Err(e) = store.clear() {
                warn!(error = %e, "Failed to remove credential file");
            }
        }
        store
    }

    /// Load credential from disk. Returns whether one was found.
    pub fn load(&self) -> Result<bool> {
        let path = self.credential_path();
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read credential file")?;
        let data: CredentialData =
            serde_json::from_str(&contents).context("Failed to parse credential file")?;
        debug!(created_at = %data.created_at, "Credential loaded");
        *self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(data);
        Ok(true)
    }

    fn credential_path(&self) -> PathBuf {
        self.cache_dir.join(CREDENTIAL_FILE)
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Option<String> {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|d| d.token.clone())
            .filter(|t| !t.is_empty())
    }

    fn store(&self, token: &str) -> Result<()> {
        let data = CredentialData {
            token: token.to_string(),
            created_at: Utc::now(),
        };
        let path = self.credential_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&data)?;
        std::fs::write(&path, contents).context("Failed to write credential file")?;
        *self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(data);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        let path = self.credential_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove credential file")?;
        }
        Ok(())
    }
}

/// Credential kept in the OS keychain under the given account name.
pub struct KeyringCredentialStore {
    account: String,
}

impl KeyringCredentialStore {
    pub fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn token(&self) -> Option<String> {
        match self.entry().and_then(|e| e.get_password().context("No credential in keychain")) {
            Ok(token) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Keychain credential unavailable");
                None
            }
        }
    }

    fn store(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store credential in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                warn!(error = %e, "Failed to delete keychain credential");
                Err(e).context("Failed to delete credential from keychain")
            }
        }
    }
}

/// Extract a named cookie from a `Cookie` request header.
/// An empty value counts as absent.
pub fn credential_from_cookie_header<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}
