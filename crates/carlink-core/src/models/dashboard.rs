//! Dashboard metrics (odometer, fuel, traction battery)

use serde::{Deserialize, Serialize};

use super::ValueWithUnit;

/// Dashboard snapshot for one vehicle.
///
/// Combustion-only vehicles leave the battery fields unset; BEVs leave the
/// fuel fields unset; PHEVs populate both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub odometer: ValueWithUnit,
    /// Fuel level in percent
    #[serde(default)]
    pub fuel_level: Option<u8>,
    /// Remaining range on fuel
    #[serde(default)]
    pub fuel_range: Option<ValueWithUnit>,
    /// Traction battery charge in percent
    #[serde(default)]
    pub battery_level: Option<u8>,
    /// Remaining range on battery
    #[serde(default)]
    pub battery_range: Option<ValueWithUnit>,
    /// Battery range with climate control active
    #[serde(default)]
    pub battery_range_with_ac: Option<ValueWithUnit>,
    /// Combined remaining range as reported by the vehicle
    #[serde(default)]
    pub range: Option<ValueWithUnit>,
    #[serde(default)]
    pub warning_lights: Vec<WarningLight>,
}

impl Dashboard {
    /// Combined range: the vehicle-reported figure when present, otherwise
    /// the sum of the per-source ranges.
    pub fn total_range(&self) -> Option<f64> {
        if let Some(r) = &self.range {
            return Some(r.value);
        }
        match (&self.fuel_range, &self.battery_range) {
            (None, None) => None,
            (fuel, battery) => Some(
                fuel.as_ref().map_or(0.0, |v| v.value)
                    + battery.as_ref().map_or(0.0, |v| v.value),
            ),
        }
    }
}

/// Active warning light on the instrument cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningLight {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}
