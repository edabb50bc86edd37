//! Error types for carlink client operations

use thiserror::Error;

/// Result type alias for carlink client operations
pub type Result<T> = std::result::Result<T, CarlinkError>;

/// Errors that can occur during carlink client operations
#[derive(Error, Debug)]
pub enum CarlinkError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Provider returned an error response
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl CarlinkError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// Classified outcome of an authentication attempt.
///
/// `InvalidUsername` and `LoginFailed` come from the full-login path only;
/// `RefreshFailed` is internal to the session manager, which absorbs it by
/// falling back to a full login and never surfaces it from
/// `ensure_valid_token`.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The provider did not recognize the login identifier
    #[error("username not recognized by the provider")]
    InvalidUsername,

    /// Any other full-login rejection (bad password, locked account,
    /// malformed response, transport failure during login)
    #[error("login rejected: {0}")]
    LoginFailed(String),

    /// The refresh exchange was rejected (expired/revoked refresh token,
    /// provider error, transport failure during refresh)
    #[error("token refresh rejected: {0}")]
    RefreshFailed(String),

    /// The token cache itself is broken, distinct from "no cached token"
    #[error("token cache unavailable: {0}")]
    CacheUnavailable(String),
}
