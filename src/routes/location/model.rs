use serde::Deserialize;

/// 直接走工作池的匹配请求，不记录、不通知
#[derive(Debug, Deserialize)]
pub struct NearbyRequest {
    pub lat: f64,
    pub lng: f64,
}
