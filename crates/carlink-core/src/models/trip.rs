//! Trip history models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one recorded trip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Distance travelled, in the account's configured unit
    pub distance: f64,
    /// Total trip duration in seconds
    #[serde(default)]
    pub duration_secs: Option<i64>,
    /// Distance covered in EV mode
    #[serde(default)]
    pub ev_distance: Option<f64>,
    /// Time spent in EV mode, in seconds
    #[serde(default)]
    pub ev_duration_secs: Option<i64>,
    /// Fuel consumed over the trip, in litres
    #[serde(default)]
    pub average_fuel_consumed: Option<f64>,
    /// Driving score (0-100) when the provider computes one
    #[serde(default)]
    pub score: Option<u8>,
}

impl TripSummary {
    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::seconds)
    }

    pub fn ev_duration(&self) -> Option<Duration> {
        self.ev_duration_secs.map(Duration::seconds)
    }
}

/// Date-ranged trip history payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripHistory {
    #[serde(default)]
    pub trips: Vec<TripSummary>,
}

impl TripHistory {
    /// Most recent trip by start time. Trips without a timestamp sort
    /// first, so a fully untimestamped history yields the last list entry.
    pub fn last_trip(&self) -> Option<&TripSummary> {
        self.trips.iter().max_by_key(|t| t.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_from_seconds() {
        let json = r#"{"distance": 15.215, "durationSecs": 1500, "evDurationSecs": 653,
                       "averageFuelConsumed": 1.485, "score": 65}"#;
        let trip: TripSummary = serde_json::from_str(json).unwrap();
        assert_eq!(trip.duration(), Some(Duration::minutes(25)));
        assert_eq!(
            trip.ev_duration(),
            Some(Duration::minutes(10) + Duration::seconds(53))
        );
        assert_eq!(trip.score, Some(65));
    }

    #[test]
    fn durations_absent_when_provider_omits_them() {
        let json = r#"{"distance": 15.215}"#;
        let trip: TripSummary = serde_json::from_str(json).unwrap();
        assert_eq!(trip.duration(), None);
        assert_eq!(trip.ev_duration(), None);
    }

    #[test]
    fn last_trip_by_start_time() {
        let json = r#"{"trips": [
            {"distance": 1.0, "startTime": "2024-03-02T08:00:00Z"},
            {"distance": 2.0, "startTime": "2024-03-01T08:00:00Z"}
        ]}"#;
        let history: TripHistory = serde_json::from_str(json).unwrap();
        assert_eq!(history.last_trip().unwrap().distance, 1.0);
    }
}
