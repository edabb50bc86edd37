//! Account notification history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the account's notification history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    /// Notification kind (alert, info, ...)
    #[serde(default, rename = "type")]
    pub notification_type: Option<String>,
    /// Originating subsystem (RemoteCommand, ChargingAlert, ...)
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_read: bool,
}

/// Notification history payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationHistory {
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_shape() {
        let json = r#"{"notifications": [
            {"message": "2020 RAV4 PHEV: Climate control was interrupted (Door open) [1]",
             "type": "alert", "category": "RemoteCommand",
             "date": "2024-01-01T16:20:20Z", "isRead": false}
        ]}"#;
        let history: NotificationHistory = serde_json::from_str(json).unwrap();
        assert_eq!(history.notifications.len(), 1);
        let n = &history.notifications[0];
        assert_eq!(n.notification_type.as_deref(), Some("alert"));
        assert_eq!(n.category.as_deref(), Some("RemoteCommand"));
        assert!(!n.is_read);
    }
}
