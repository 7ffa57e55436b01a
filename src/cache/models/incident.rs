use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Incident;

/// 事件快照缓存模型，只保留匹配所需字段
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedIncident {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

impl From<&Incident> for CachedIncident {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            lat: incident.lat,
            lng: incident.lng,
            radius_km: incident.radius_km,
        }
    }
}
