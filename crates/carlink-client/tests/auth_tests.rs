//! Integration tests for the authentication core
//!
//! Each test spins up the in-process mock provider and drives the session
//! manager through the real HTTP surface, asserting on the provider's
//! per-endpoint hit counters to pin down exactly which network exchanges a
//! call performed.

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use carlink_client::auth::{
    Authenticator, FileTokenCache, MemoryTokenCache, SessionManager, TokenCache, TokenRecord,
};
use carlink_client::testing::{LoginScenario, TestServer, TEST_UUID};
use carlink_client::{AuthError, CloudConfig};

const USER: &str = "user@example.com";
const PASSWORD: &str = "hunter2";

fn session_for(server: &TestServer, cache: Arc<dyn TokenCache>) -> SessionManager {
    let config = CloudConfig::single_host(&server.base_url()).unwrap();
    SessionManager::new(Authenticator::new(config).unwrap(), cache)
}

fn record(access: &str, expiration: chrono::DateTime<Utc>) -> TokenRecord {
    TokenRecord {
        access_token: access.to_string(),
        refresh_token: "refresh-token-0".to_string(),
        account_uuid: Uuid::parse_str(TEST_UUID).unwrap(),
        expiration,
    }
}

#[tokio::test]
async fn fresh_cache_fast_path_performs_no_network_calls() {
    let server = TestServer::start(LoginScenario::Success).await.unwrap();
    let cache = Arc::new(MemoryTokenCache::new());
    cache
        .put(USER, record("cached-access", Utc::now() + Duration::hours(4)))
        .await
        .unwrap();

    let session = session_for(&server, cache);
    let token = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap();

    assert_eq!(token, "cached-access");
    assert_eq!(server.provider().total_hits(), 0);
}

#[tokio::test]
async fn expired_cache_refreshes_once_and_writes_through() {
    let server = TestServer::start(LoginScenario::Success).await.unwrap();
    let cache: Arc<dyn TokenCache> = Arc::new(MemoryTokenCache::new());
    cache
        .put(USER, record("stale-access", Utc::now() - Duration::hours(1)))
        .await
        .unwrap();

    let session = session_for(&server, cache);
    let token = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap();

    assert_eq!(token, "access-token-1");
    assert_eq!(server.provider().refresh_hits(), 1);
    // No full-login traffic at all.
    assert_eq!(server.provider().authenticate_hits(), 0);
    assert_eq!(server.provider().authorize_hits(), 0);
    assert_eq!(server.provider().code_exchange_hits(), 0);

    let stored = session.cache().get(USER).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-token-1");
    assert!(stored.expiration > Utc::now());
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_exactly_one_full_login() {
    let server = TestServer::start_with(LoginScenario::Success, false)
        .await
        .unwrap();
    let cache: Arc<dyn TokenCache> = Arc::new(MemoryTokenCache::new());
    cache
        .put(USER, record("stale-access", Utc::now() - Duration::hours(1)))
        .await
        .unwrap();

    let session = session_for(&server, cache);
    let token = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap();

    // One refresh attempt, then one login sequence, nothing more.
    assert_eq!(server.provider().refresh_hits(), 1);
    assert_eq!(server.provider().authorize_hits(), 1);
    assert_eq!(server.provider().code_exchange_hits(), 1);
    assert_eq!(token, "access-token-1");

    let stored = session.cache().get(USER).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-token-1");
}

#[tokio::test]
async fn unknown_username_fails_and_leaves_cache_unwritten() {
    let server = TestServer::start(LoginScenario::InvalidUsername)
        .await
        .unwrap();
    let session = session_for(&server, Arc::new(MemoryTokenCache::new()));
    let err = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidUsername));
    assert!(session.cache().get(USER).await.unwrap().is_none());
    // The flow stopped at the handshake; no code was ever exchanged.
    assert_eq!(server.provider().code_exchange_hits(), 0);
}

#[tokio::test]
async fn wrong_password_fails_and_leaves_cache_unwritten() {
    let server = TestServer::start(LoginScenario::WrongPassword).await.unwrap();
    let session = session_for(&server, Arc::new(MemoryTokenCache::new()));
    let err = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::LoginFailed(_)));
    assert!(session.cache().get(USER).await.unwrap().is_none());
    assert_eq!(server.provider().code_exchange_hits(), 0);
}

#[tokio::test]
async fn second_call_after_login_hits_the_fast_path() {
    let server = TestServer::start(LoginScenario::Success).await.unwrap();
    let session = session_for(&server, Arc::new(MemoryTokenCache::new()));

    let first = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap();
    let second = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap();

    assert_eq!(first, second);
    // One full sequence total: the second call never touched the provider.
    assert_eq!(server.provider().code_exchange_hits(), 1);
    assert_eq!(server.provider().authorize_hits(), 1);
    assert_eq!(server.provider().refresh_hits(), 0);
}

#[tokio::test]
async fn concurrent_calls_for_one_account_share_one_login() {
    let server = TestServer::start(LoginScenario::Success).await.unwrap();
    let session = Arc::new(session_for(&server, Arc::new(MemoryTokenCache::new())));

    let a = {
        let session = session.clone();
        tokio::spawn(async move { session.ensure_valid_token(USER, USER, PASSWORD).await })
    };
    let b = {
        let session = session.clone();
        tokio::spawn(async move { session.ensure_valid_token(USER, USER, PASSWORD).await })
    };

    let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

    assert_eq!(a, b);
    assert_eq!(server.provider().code_exchange_hits(), 1);
}

#[tokio::test]
async fn file_cache_keeps_fast_path_across_instances() {
    let server = TestServer::start(LoginScenario::Success).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");

    // First "process": full login, record persisted.
    {
        let session = session_for(&server, Arc::new(FileTokenCache::new(&path)));
        session
            .ensure_valid_token(USER, USER, PASSWORD)
            .await
            .unwrap();
    }
    assert_eq!(server.provider().code_exchange_hits(), 1);

    // Second "process": fresh cache instance over the same file.
    let session = session_for(&server, Arc::new(FileTokenCache::new(&path)));
    let token = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap();

    assert_eq!(token, "access-token-1");
    assert_eq!(server.provider().code_exchange_hits(), 1);
}

#[tokio::test]
async fn broken_cache_surfaces_as_cache_unavailable_not_absent() {
    let server = TestServer::start(LoginScenario::Success).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    tokio::fs::write(&path, b"{definitely not json").await.unwrap();

    let session = session_for(&server, Arc::new(FileTokenCache::new(&path)));
    let err = session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::CacheUnavailable(_)));
    // A broken cache must not silently trigger a login.
    assert_eq!(server.provider().total_hits(), 0);
}

#[tokio::test]
async fn login_populates_record_from_provider_claims() {
    let server = TestServer::start(LoginScenario::Success).await.unwrap();
    let session = session_for(&server, Arc::new(MemoryTokenCache::new()));
    session
        .ensure_valid_token(USER, USER, PASSWORD)
        .await
        .unwrap();

    let stored = session.cache().get(USER).await.unwrap().unwrap();
    assert_eq!(stored.account_uuid.to_string(), TEST_UUID);
    assert_eq!(stored.refresh_token, "refresh-token-1");
    // TTL from the provider's expires_in, minus nothing: ~1 hour out.
    assert!(stored.expiration > Utc::now() + Duration::minutes(55));
    assert!(stored.expiration < Utc::now() + Duration::minutes(65));
}
