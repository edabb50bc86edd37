//! Provider endpoint configuration

use std::time::Duration;

use url::Url;

use crate::error::Result;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cloud endpoint configuration.
///
/// The provider splits its surface across two hosts: the OpenAM-style login
/// realm and the telemetry API. Tests point both at an in-process mock
/// provider via [`CloudConfig::single_host`].
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Base URL of the login realm
    pub auth_base_url: Url,
    /// Base URL of the telemetry API
    pub api_base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl CloudConfig {
    /// Login handshake endpoint (callback document exchange)
    pub const AUTHENTICATE_PATH: &'static str = "/json/realms/root/realms/tme/authenticate";
    /// OAuth2 authorize endpoint (session cookie → authorization code)
    pub const AUTHORIZE_PATH: &'static str = "/oauth2/realms/root/realms/tme/authorize";
    /// OAuth2 token endpoint (code or refresh token → token pair)
    pub const TOKEN_PATH: &'static str = "/oauth2/realms/root/realms/tme/access_token";

    /// OAuth2 client id registered for this app
    pub const CLIENT_ID: &'static str = "oneapp";
    /// Redirect URI registered for the authorization-code exchange
    pub const REDIRECT_URI: &'static str = "com.carlink.app:/oauth2redirect";

    /// Create a configuration with explicit auth and API hosts
    pub fn new(auth_base_url: &str, api_base_url: &str) -> Result<Self> {
        Ok(Self {
            auth_base_url: Url::parse(auth_base_url)?,
            api_base_url: Url::parse(api_base_url)?,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Point both the login realm and the telemetry API at one host.
    ///
    /// Used by tests to route everything through the in-process mock
    /// provider.
    pub fn single_host(base_url: &str) -> Result<Self> {
        Self::new(base_url, base_url)
    }

    /// Override both timeouts
    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    /// Resolve a path against the login realm
    pub fn auth_url(&self, path: &str) -> Result<Url> {
        Ok(self.auth_base_url.join(path)?)
    }

    /// Resolve a path against the telemetry API
    pub fn api_url(&self, path: &str) -> Result<Url> {
        Ok(self.api_base_url.join(path)?)
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        // Hardcoded production hosts; the literals are known-valid URLs.
        Self::new(
            "https://b2c-login.carlink-cloud.io",
            "https://oneapi.carlink-cloud.io",
        )
        .expect("production endpoint literals parse")
    }
}
