use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct LocationCheckRequest {
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct LocationCheckResponse {
    pub incidents: Vec<String>,
}

/// 一次位置检查的记录，写入后不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCheck {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub incident_ids: Vec<Uuid>,
    pub checked_at: DateTime<Utc>,
}

impl LocationCheck {
    pub fn new(user_id: Uuid, lat: f64, lng: f64, incident_ids: Vec<Uuid>, checked_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            lat,
            lng,
            incident_ids,
            checked_at,
        }
    }
}

/// 时间窗口内的检查统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentStats {
    pub unique_users: i64,
    pub total_checks: i64,
    pub minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub minutes: Option<i64>,
}
