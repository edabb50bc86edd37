//! Last-known vehicle location

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last parked position reported by the vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// When the position was recorded
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Reverse-geocoded address, when the provider supplies one
    #[serde(default)]
    pub display_name: Option<String>,
}
