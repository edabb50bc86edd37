//! Response envelope shared by all telemetry endpoints

use serde::{Deserialize, Serialize};

/// Envelope the provider wraps every telemetry payload in.
///
/// Success responses carry the typed payload; error responses omit it and
/// populate `status.messages` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    // No `default` attribute here: it would put a `T: Default` bound on the
    // derived impl, and a missing Option field deserializes as None anyway.
    pub payload: Option<T>,
    #[serde(default)]
    pub status: Option<ResponseStatus>,
}

impl<T> ApiResponse<T> {
    /// First human-readable status message, if the provider sent one.
    pub fn status_message(&self) -> Option<&str> {
        self.status
            .as_ref()?
            .messages
            .iter()
            .find_map(|m| m.description.as_deref())
    }
}

/// Status block accompanying a payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseStatus {
    #[serde(default)]
    pub messages: Vec<StatusMessage>,
}

/// Individual status message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    #[serde(default)]
    pub response_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub detailed_description: Option<String>,
}

/// A numeric reading paired with its unit (km, mi, L, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueWithUnit {
    pub value: f64,
    pub unit: String,
}
