//! Cached token record

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One account's token state, as stored in the token cache.
///
/// `expiration` is an absolute UTC instant; it serializes as RFC 3339 so a
/// record written by one process deserializes to the same instant in another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer credential for telemetry requests
    pub access_token: String,
    /// Credential for minting a new access token without a password
    pub refresh_token: String,
    /// Provider-internal account id, distinct from the login username
    pub account_uuid: Uuid,
    /// Instant after which `access_token` must not be used
    pub expiration: DateTime<Utc>,
}

impl TokenRecord {
    /// Whether the access token is still usable, keeping `margin` of slack
    /// before the real expiry so a token does not expire mid-request.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.expiration - margin > Utc::now()
    }
}
