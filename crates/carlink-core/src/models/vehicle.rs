//! Vehicle summary models (account's vehicle list)

use serde::{Deserialize, Serialize};

/// One vehicle associated with the account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSummary {
    pub vin: String,
    /// Owner-chosen display name
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub model_year: Option<u16>,
    /// Marketing image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Whether the vehicle carries a traction battery (EV/PHEV)
    #[serde(default)]
    pub ev_vehicle: bool,
    #[serde(default)]
    pub fuel_type: Option<String>,
    /// Remote services available for this vehicle
    #[serde(default)]
    pub remote_services: Vec<String>,
}

impl VehicleSummary {
    /// Display name: the nickname when set, otherwise the model name,
    /// otherwise the VIN.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.model_name.as_deref())
            .unwrap_or(&self.vin)
    }
}

/// Vehicle list payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleList {
    #[serde(default)]
    pub vehicles: Vec<VehicleSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_nickname() {
        let json = r#"{"vin": "12345678912345678", "nickname": "RAV4",
                       "modelName": "RAV4 PHEV", "evVehicle": true}"#;
        let v: VehicleSummary = serde_json::from_str(json).unwrap();
        assert_eq!(v.display_name(), "RAV4");
        assert!(v.ev_vehicle);
    }

    #[test]
    fn display_name_falls_back_to_vin() {
        let json = r#"{"vin": "12345678912345678"}"#;
        let v: VehicleSummary = serde_json::from_str(json).unwrap();
        assert_eq!(v.display_name(), "12345678912345678");
    }
}
