use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cache::{IncidentCache, WebhookQueue};
use crate::database::CheckRecorder;
use crate::error::CheckError;
use crate::models::{LocationCheck, WebhookPayload};
use crate::services::matcher::find_nearby;
use crate::utils::is_valid_coordinate;

/// 用户位置检查
///
/// 快照读取失败会直接返回错误；记录和通知入队都是尽力而为，
/// 失败只记日志，不影响返回给用户的命中结果。
pub struct LocationService {
    cache: Arc<dyn IncidentCache>,
    recorder: Arc<dyn CheckRecorder>,
    queue: Arc<dyn WebhookQueue>,
    clock: fn() -> DateTime<Utc>,
}

impl LocationService {
    pub fn new(
        cache: Arc<dyn IncidentCache>,
        recorder: Arc<dyn CheckRecorder>,
        queue: Arc<dyn WebhookQueue>,
    ) -> Self {
        Self {
            cache,
            recorder,
            queue,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn check_location(
        &self,
        user_id: &str,
        lat: f64,
        lng: f64,
    ) -> Result<Vec<String>, CheckError> {
        if !is_valid_coordinate(lat, lng) {
            tracing::warn!(user_id, lat, lng, "Invalid coordinates");
            return Err(CheckError::InvalidCoordinates);
        }

        let user_uuid = Uuid::parse_str(user_id).map_err(|e| {
            tracing::warn!(user_id, error = %e, "Invalid user id");
            CheckError::InvalidUserId
        })?;

        let incidents = self.cache.get_active().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read active incident snapshot");
            CheckError::from(e)
        })?;

        let nearby = find_nearby(lat, lng, &incidents);
        tracing::debug!(total = incidents.len(), nearby = nearby.len(), "Haversine filter done");

        let ids: Vec<Uuid> = nearby.iter().map(|n| n.id).collect();
        let check = LocationCheck::new(user_uuid, lat, lng, ids, (self.clock)());

        if let Err(e) = self.recorder.save_check(&check).await {
            tracing::error!(user_id, error = %e, "Failed to save location check");
        }

        if !check.incident_ids.is_empty() {
            let payload = WebhookPayload::from(&check);
            match self.queue.enqueue(&payload).await {
                Ok(()) => tracing::info!(
                    user_id,
                    incidents = check.incident_ids.len(),
                    "Webhook enqueued"
                ),
                Err(e) => tracing::error!(user_id, error = %e, "Failed to enqueue webhook"),
            }
        }

        tracing::info!(user_id, incidents_found = check.incident_ids.len(), "Location check done");
        Ok(check.incident_ids.iter().map(Uuid::to_string).collect())
    }
}
