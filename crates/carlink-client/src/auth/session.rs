//! Session manager: cache lookup, freshness, refresh-vs-reauthenticate
//!
//! Single public entry point for callers that need a usable access token.
//! The decision sequence per call:
//!
//! 1. cached record, still fresh   -> return it, zero network calls
//! 2. cached record, stale         -> one refresh attempt
//! 3. refresh rejected / no record -> one full login
//!
//! Exactly one internal fallback hop (refresh -> full login), never a loop.
//! Refresh rejections are absorbed here; login rejections propagate to the
//! caller unchanged and nothing is written to the cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use crate::error::AuthError;

use super::authenticator::Authenticator;
use super::cache::TokenCache;
use super::token::TokenRecord;

/// Slack kept before the real expiry so a token cannot expire mid-request
const FRESHNESS_MARGIN_SECS: i64 = 120;

/// Orchestrates the token cache and the authenticator.
///
/// Concurrent calls for the same account are serialized on a per-account
/// async mutex: the second caller waits for the in-flight attempt, then
/// rides its cached result instead of issuing duplicate provider requests.
pub struct SessionManager {
    authenticator: Authenticator,
    cache: Arc<dyn TokenCache>,
    margin: Duration,
    account_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(authenticator: Authenticator, cache: Arc<dyn TokenCache>) -> Self {
        Self {
            authenticator,
            cache,
            margin: Duration::seconds(FRESHNESS_MARGIN_SECS),
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Override the freshness margin (tests)
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// The token cache this manager reads and writes through
    pub fn cache(&self) -> &Arc<dyn TokenCache> {
        &self.cache
    }

    /// Return a usable access token for the account, authenticating or
    /// refreshing as needed. The sole public surface of the auth core.
    pub async fn ensure_valid_token(
        &self,
        account_id: &str,
        username: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        self.ensure_valid_record(account_id, username, password)
            .await
            .map(|record| record.access_token)
    }

    /// Like [`ensure_valid_token`](Self::ensure_valid_token) but returns the
    /// whole record; the vehicle facade also needs the account uuid.
    #[instrument(skip(self, username, password))]
    pub async fn ensure_valid_record(
        &self,
        account_id: &str,
        username: &str,
        password: &str,
    ) -> Result<TokenRecord, AuthError> {
        let lock = self.lock_for(account_id);
        let _guard = lock.lock().await;

        match self.cache.get(account_id).await? {
            Some(record) if record.is_fresh(self.margin) => {
                debug!("cached token still fresh, no network call");
                return Ok(record);
            }
            Some(record) => {
                debug!("cached token stale, attempting refresh");
                match self.authenticator.refresh(&record.refresh_token).await {
                    Ok(refreshed) => {
                        self.cache.put(account_id, refreshed.clone()).await?;
                        return Ok(refreshed);
                    }
                    Err(err) => {
                        // Absorbed: the one allowed fallback hop.
                        warn!(error = %err, "refresh rejected, falling back to full login");
                    }
                }
            }
            None => debug!("no cached token, full login required"),
        }

        let record = self.authenticator.authenticate(username, password).await?;
        self.cache.put(account_id, record.clone()).await?;
        Ok(record)
    }

    /// Per-account mutex, created on first use. The outer map lock is only
    /// held for the lookup, never across an await.
    fn lock_for(&self, account_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.account_locks.lock();
        locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}
