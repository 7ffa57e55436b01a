use serde::Serialize;
use uuid::Uuid;

use crate::cache::CachedIncident;
use crate::utils::haversine_km;

/// 单个命中的事件及其与查询点的距离
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyIncident {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    pub distance_km: f64,
}

/// 找出所有覆盖给定坐标的事件
///
/// 每个事件用自己的半径判断，距离恰好等于半径也算命中。
/// 结果保持快照中的顺序，空快照返回空结果。
pub fn find_nearby(lat: f64, lng: f64, incidents: &[CachedIncident]) -> Vec<NearbyIncident> {
    incidents
        .iter()
        .filter_map(|incident| {
            let distance_km = haversine_km(lat, lng, incident.lat, incident.lng);
            (distance_km <= incident.radius_km).then(|| NearbyIncident {
                id: incident.id,
                lat: incident.lat,
                lng: incident.lng,
                radius_km: incident.radius_km,
                distance_km,
            })
        })
        .collect()
}
