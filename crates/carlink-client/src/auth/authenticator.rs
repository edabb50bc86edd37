//! Credential authenticator: the provider's multi-step login protocol
//!
//! The login realm speaks an OpenAM-style callback protocol: the client POSTs
//! a JSON document, the realm answers with the same document extended by
//! `callbacks` it wants filled in (username, password), and the exchange
//! repeats until a response carries a `tokenId` session credential. That
//! session is then traded for an OAuth2 authorization code, which is traded
//! for the access/refresh token pair.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use reqwest::{redirect, Client};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::CloudConfig;
use crate::error::AuthError;

use super::token::TokenRecord;

/// Upper bound on callback exchanges before the login flow is declared stuck
const MAX_LOGIN_STEPS: usize = 10;

/// Session cookie name the authorize endpoint expects
const SESSION_COOKIE: &str = "iPlanetDirectoryPro";

/// Token endpoint response for both grant types
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    id_token: String,
    expires_in: i64,
}

/// Drives the provider's login handshake and refresh exchange.
///
/// Produces [`TokenRecord`]s; never touches the token cache. The session
/// manager owns cache writes.
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: Client,
    config: CloudConfig,
}

impl Authenticator {
    /// Build an authenticator for the given endpoints.
    ///
    /// Redirect following is disabled: the authorize step's `Location`
    /// header is data, not navigation.
    pub fn new(config: CloudConfig) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { http, config })
    }

    /// Perform the full login handshake and return a populated record.
    ///
    /// Classification: a callback document announcing the username is
    /// unknown fails with [`AuthError::InvalidUsername`]; every other
    /// rejection (bad password, unexpected status, malformed response,
    /// transport fault) fails with [`AuthError::LoginFailed`].
    #[instrument(skip(self, username, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenRecord, AuthError> {
        let session_token = self.run_callback_flow(username, password).await?;
        let code = self.fetch_authorization_code(&session_token).await?;
        debug!("authorization code obtained, exchanging for tokens");

        let tokens = self
            .request_tokens(&[
                ("client_id", CloudConfig::CLIENT_ID),
                ("redirect_uri", CloudConfig::REDIRECT_URI),
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
            ])
            .await
            .map_err(AuthError::LoginFailed)?;

        Self::build_record(tokens).map_err(AuthError::LoginFailed)
    }

    /// Mint a new access token from an existing refresh token.
    ///
    /// Any rejection is [`AuthError::RefreshFailed`]; the login-path error
    /// classes are never produced here.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRecord, AuthError> {
        let tokens = self
            .request_tokens(&[
                ("client_id", CloudConfig::CLIENT_ID),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(AuthError::RefreshFailed)?;

        Self::build_record(tokens).map_err(AuthError::RefreshFailed)
    }

    /// Run the callback exchange until the realm issues a session `tokenId`.
    async fn run_callback_flow(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        let url = self
            .config
            .auth_url(CloudConfig::AUTHENTICATE_PATH)
            .map_err(|e| AuthError::LoginFailed(e.to_string()))?;

        let mut document = Value::Object(serde_json::Map::new());
        for step in 0..MAX_LOGIN_STEPS {
            let response = self
                .http
                .post(url.clone())
                .json(&document)
                .send()
                .await
                .map_err(|e| AuthError::LoginFailed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(AuthError::LoginFailed(format!(
                    "authenticate step {step} returned HTTP {status}"
                )));
            }

            document = response
                .json()
                .await
                .map_err(|e| AuthError::LoginFailed(format!("malformed callback document: {e}")))?;

            if let Some(token_id) = document.get("tokenId").and_then(Value::as_str) {
                debug!(steps = step + 1, "login handshake complete");
                return Ok(token_id.to_string());
            }

            fill_callbacks(&mut document, username, password)?;
        }

        Err(AuthError::LoginFailed(format!(
            "login flow did not converge within {MAX_LOGIN_STEPS} steps"
        )))
    }

    /// Trade the realm session for an OAuth2 authorization code.
    async fn fetch_authorization_code(&self, session_token: &str) -> Result<String, AuthError> {
        let url = self
            .config
            .auth_url(CloudConfig::AUTHORIZE_PATH)
            .map_err(|e| AuthError::LoginFailed(e.to_string()))?;

        let response = self
            .http
            .get(url)
            .query(&[
                ("client_id", CloudConfig::CLIENT_ID),
                ("redirect_uri", CloudConfig::REDIRECT_URI),
                ("response_type", "code"),
                ("scope", "openid profile write"),
            ])
            .header(
                reqwest::header::COOKIE,
                format!("{SESSION_COOKIE}={session_token}"),
            )
            .send()
            .await
            .map_err(|e| AuthError::LoginFailed(e.to_string()))?;

        if !response.status().is_redirection() {
            return Err(AuthError::LoginFailed(format!(
                "authorize returned HTTP {} instead of a redirect",
                response.status()
            )));
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AuthError::LoginFailed("authorize redirect without Location".into()))?;

        extract_code(location).ok_or_else(|| {
            AuthError::LoginFailed("authorize redirect carried no authorization code".into())
        })
    }

    /// Single form exchange against the token endpoint. Shared by the
    /// authorization-code and refresh-token grants; the caller classifies
    /// the failure.
    async fn request_tokens(&self, form: &[(&str, &str)]) -> Result<TokenResponse, String> {
        let url = self
            .config
            .auth_url(CloudConfig::TOKEN_PATH)
            .map_err(|e| e.to_string())?;

        let response = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("token endpoint returned HTTP {status}: {body}"));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| format!("malformed token response: {e}"))
    }

    /// Assemble a record from a token response: expiration from the declared
    /// TTL, account uuid from the ID-token claims.
    fn build_record(tokens: TokenResponse) -> Result<TokenRecord, String> {
        let account_uuid = uuid_claim(&tokens.id_token)?;
        Ok(TokenRecord {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            account_uuid,
            expiration: Utc::now() + Duration::seconds(tokens.expires_in),
        })
    }
}

/// Fill the realm's callbacks in place: username into `NameCallback`,
/// password into `PasswordCallback`. A `TextOutputCallback` announcing
/// `User Not Found` classifies as an unknown username.
fn fill_callbacks(document: &mut Value, username: &str, password: &str) -> Result<(), AuthError> {
    let Some(callbacks) = document.get_mut("callbacks").and_then(Value::as_array_mut) else {
        return Err(AuthError::LoginFailed(
            "callback document without callbacks or tokenId".into(),
        ));
    };

    for callback in callbacks {
        match callback.get("type").and_then(Value::as_str) {
            Some("NameCallback") => set_input(callback, username),
            Some("PasswordCallback") => set_input(callback, password),
            Some("TextOutputCallback") => {
                let message = callback
                    .pointer("/output/0/value")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if message.contains("User Not Found") {
                    return Err(AuthError::InvalidUsername);
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn set_input(callback: &mut Value, value: &str) {
    if let Some(input) = callback.pointer_mut("/input/0/value") {
        *input = Value::String(value.to_string());
    }
}

/// Pull the `code` query parameter out of a redirect target.
fn extract_code(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
}

/// Read the `uuid` claim from an ID token payload.
///
/// The signature is not verified: the token was just received over TLS from
/// the issuer itself and the claim is only used as a routing header.
fn uuid_claim(id_token: &str) -> Result<Uuid, String> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| "ID token is not a JWT".to_string())?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| format!("ID token payload is not base64url: {e}"))?;

    let claims: Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("ID token claims not JSON: {e}"))?;

    let uuid = claims
        .get("uuid")
        .and_then(Value::as_str)
        .ok_or_else(|| "ID token carries no uuid claim".to_string())?;

    Uuid::parse_str(uuid).map_err(|e| format!("uuid claim malformed: {e}"))
}
