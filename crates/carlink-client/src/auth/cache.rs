//! Token cache: in-memory and durable file-backed stores
//!
//! The cache answers "what token state do we have for this account" and
//! nothing more. Freshness decisions belong to the session manager; a
//! storage fault is reported as [`CacheError`], never as an absent entry.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use super::token::TokenRecord;

/// Result type for token cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Storage-layer faults of a token cache
#[derive(Error, Debug)]
pub enum CacheError {
    /// Underlying store could not be read or written
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document exists but does not decode
    #[error("cache document corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<CacheError> for crate::error::AuthError {
    fn from(err: CacheError) -> Self {
        crate::error::AuthError::CacheUnavailable(err.to_string())
    }
}

/// Token store keyed by account identifier (the login username).
///
/// One entry per account. Entries are created on first successful login,
/// overwritten on every successful refresh or re-login, and only removed by
/// the explicit `clear` teardown hook.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Stored record for the account, if any. No freshness check.
    async fn get(&self, account_id: &str) -> CacheResult<Option<TokenRecord>>;

    /// Overwrite the account's record. Atomic per key: a concurrent reader
    /// sees either the previous record or the new one, never a partial write.
    async fn put(&self, account_id: &str, record: TokenRecord) -> CacheResult<()>;

    /// Remove the account's record (test/teardown hook).
    async fn clear(&self, account_id: &str) -> CacheResult<()>;
}

/// Process-lifetime token cache
#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    entries: RwLock<HashMap<String, TokenRecord>>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenCache for MemoryTokenCache {
    async fn get(&self, account_id: &str) -> CacheResult<Option<TokenRecord>> {
        Ok(self.entries.read().get(account_id).cloned())
    }

    async fn put(&self, account_id: &str, record: TokenRecord) -> CacheResult<()> {
        self.entries.write().insert(account_id.to_string(), record);
        Ok(())
    }

    async fn clear(&self, account_id: &str) -> CacheResult<()> {
        self.entries.write().remove(account_id);
        Ok(())
    }
}

/// Durable token cache backed by a JSON document.
///
/// The whole account→record map lives in one file. Writes go to a sibling
/// temp file first and are renamed into place, so a reader never observes a
/// half-written document. A missing file means "no entries"; an unreadable
/// or undecodable file is a [`CacheError`].
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    path: PathBuf,
}

impl FileTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> CacheResult<HashMap<String, TokenRecord>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn store(&self, entries: &HashMap<String, TokenRecord>) -> CacheResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenCache for FileTokenCache {
    async fn get(&self, account_id: &str) -> CacheResult<Option<TokenRecord>> {
        Ok(self.load().await?.remove(account_id))
    }

    async fn put(&self, account_id: &str, record: TokenRecord) -> CacheResult<()> {
        let mut entries = self.load().await?;
        entries.insert(account_id.to_string(), record);
        self.store(&entries).await
    }

    async fn clear(&self, account_id: &str) -> CacheResult<()> {
        let mut entries = self.load().await?;
        if entries.remove(account_id).is_some() {
            self.store(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;

    fn record(access: &str) -> TokenRecord {
        TokenRecord {
            access_token: access.to_string(),
            refresh_token: "refresh".to_string(),
            account_uuid: Uuid::nil(),
            expiration: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn memory_put_get_clear() {
        let cache = MemoryTokenCache::new();
        assert!(cache.get("user@example.com").await.unwrap().is_none());

        cache.put("user@example.com", record("a1")).await.unwrap();
        let stored = cache.get("user@example.com").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "a1");

        // put overwrites
        cache.put("user@example.com", record("a2")).await.unwrap();
        let stored = cache.get("user@example.com").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "a2");

        cache.clear("user@example.com").await.unwrap();
        assert!(cache.get("user@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let cache = FileTokenCache::new(&path);
        cache.put("user@example.com", record("a1")).await.unwrap();
        drop(cache);

        // fresh instance, same file: simulates a process restart
        let cache = FileTokenCache::new(&path);
        let stored = cache.get("user@example.com").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "a1");
    }

    #[tokio::test]
    async fn file_cache_missing_file_is_absent_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileTokenCache::new(dir.path().join("tokens.json"));
        assert!(cache.get("user@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_cache_corrupt_document_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let cache = FileTokenCache::new(&path);
        let err = cache.get("user@example.com").await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt(_)));
    }

    #[tokio::test]
    async fn file_cache_keeps_other_accounts_on_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileTokenCache::new(dir.path().join("tokens.json"));
        cache.put("a@example.com", record("a")).await.unwrap();
        cache.put("b@example.com", record("b")).await.unwrap();

        cache.clear("a@example.com").await.unwrap();
        assert!(cache.get("a@example.com").await.unwrap().is_none());
        assert!(cache.get("b@example.com").await.unwrap().is_some());
    }
}
