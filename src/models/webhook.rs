use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LocationCheck;

/// 回调给外部系统的 webhook 消息体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub incidents: Vec<Uuid>,
    pub checked_at: DateTime<Utc>,
}

impl From<&LocationCheck> for WebhookPayload {
    fn from(check: &LocationCheck) -> Self {
        Self {
            user_id: check.user_id.to_string(),
            lat: check.lat,
            lng: check.lng,
            incidents: check.incident_ids.clone(),
            checked_at: check.checked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wire_format_matches_callback_contract() {
        let incident = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let payload = WebhookPayload {
            user_id: "00000000-0000-0000-0000-000000000001".into(),
            lat: 55.75,
            lng: 37.61,
            incidents: vec![incident],
            checked_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "user_id": "00000000-0000-0000-0000-000000000001",
                "lat": 55.75,
                "lng": 37.61,
                "incidents": ["11111111-1111-1111-1111-111111111111"],
                "checked_at": "2025-01-02T03:04:05Z",
            })
        );
    }
}
