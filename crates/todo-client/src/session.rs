//! Session persistence.
//!
//! A [`TokenStore`] is a small durable key/value store holding the
//! authentication state the client needs across process restarts.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Keys the client reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    UserInfo,
    /// Login identifier kept for "remember me". Not authentication state.
    RememberedLogin,
}

impl StorageKey {
    /// Keys removed when a session ends.
    pub const SESSION: [StorageKey; 3] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::UserInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "accessToken",
            StorageKey::RefreshToken => "refreshToken",
            StorageKey::UserInfo => "userInfo",
            StorageKey::RememberedLogin => "rememberedEmail",
        }
    }
}

/// Access/refresh token pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// TokenStore Trait
// ============================================================================

/// Durable key/value store for session state.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Read a value.
    async fn get(&self, key: StorageKey) -> Result<Option<String>>;

    /// Write a value.
    async fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: StorageKey) -> Result<()>;

    /// Read both tokens; `None` unless both are present.
    async fn token_pair(&self) -> Result<Option<TokenPair>> {
        let access = self.get(StorageKey::AccessToken).await?;
        let refresh = self.get(StorageKey::RefreshToken).await?;
        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            _ => None,
        })
    }

    /// Replace both tokens.
    async fn save_token_pair(&self, pair: &TokenPair) -> Result<()> {
        self.set(StorageKey::AccessToken, &pair.access_token).await?;
        self.set(StorageKey::RefreshToken, &pair.refresh_token).await
    }
}

pub type SharedTokenStore = Arc<dyn TokenStore>;

// ============================================================================
// FileTokenStore
// ============================================================================

/// JSON-file token store for production use.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cache: RwLock<Option<BTreeMap<String, String>>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Store(format!("Failed to read session file: {}", e)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| Error::Store(format!("Failed to parse session file: {}", e)))
    }

    /// Replace the file atomically: write a sibling temp file, then rename.
    fn write_file(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Store(format!("Failed to create session directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| Error::Store(format!("Failed to serialize session: {}", e)))?;

        let tmp = self.tmp_path();
        let written = open_private(&tmp).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::Store(format!("Failed to write session file: {}", e)));
        }

        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            Error::Store(format!("Failed to replace session file: {}", e))
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Apply a mutation under the write lock and persist the result.
    ///
    /// An unreadable file is replaced rather than blocking every later write.
    async fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut cache = self.cache.write().await;
        let (mut entries, recovered) = match cache.take() {
            Some(entries) => (entries, false),
            None => match self.read_file() {
                Ok(entries) => (entries, false),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Discarding unreadable session file"
                    );
                    (BTreeMap::new(), true)
                }
            },
        };

        let changed = mutate(&mut entries);
        let result = if changed || recovered {
            self.write_file(&entries)
        } else {
            Ok(())
        };
        *cache = Some(entries);
        result
    }
}

/// Create (or truncate) a file readable only by its owner.
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        {
            let cache = self.cache.read().await;
            if let Some(entries) = cache.as_ref() {
                return Ok(entries.get(key.as_str()).cloned());
            }
        }

        let mut cache = self.cache.write().await;
        if cache.is_none() {
            *cache = Some(self.read_file()?);
        }
        Ok(cache
            .as_ref()
            .and_then(|entries| entries.get(key.as_str()).cloned()))
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value.to_string());
            true
        })
        .await?;
        tracing::debug!(key = key.as_str(), path = %self.path.display(), "Session value stored");
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        self.update(|entries| entries.remove(key.as_str()).is_some())
            .await
    }
}

// ============================================================================
// InMemoryTokenStore (for testing)
// ============================================================================

/// In-memory token store for tests and ephemeral clients.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    entries: RwLock<BTreeMap<StorageKey, String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a token pair.
    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(StorageKey::AccessToken, access_token.to_string());
        entries.insert(StorageKey::RefreshToken, refresh_token.to_string());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, key: StorageKey) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.entries.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        self.entries.write().await.remove(&key);
        Ok(())
    }
}
