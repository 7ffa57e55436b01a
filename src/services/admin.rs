use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::database::IncidentRepository;
use crate::error::AdminError;
use crate::models::{
    CreateIncidentRequest, Incident, IncidentStatus, ListIncidentsResponse, UpdateIncidentRequest,
};
use crate::services::snapshot::SnapshotRefresher;

const DEFAULT_PAGE_LIMIT: i64 = 20;
const MAX_PAGE_LIMIT: i64 = 100;

/// 事件管理
///
/// 每次写操作成功后同步刷新活跃事件快照；刷新失败只记日志，
/// 由后台定时刷新兜底。
pub struct AdminService {
    repo: Arc<dyn IncidentRepository>,
    refresher: Arc<SnapshotRefresher>,
}

impl AdminService {
    pub fn new(repo: Arc<dyn IncidentRepository>, refresher: Arc<SnapshotRefresher>) -> Self {
        Self { repo, refresher }
    }

    pub async fn create(&self, req: CreateIncidentRequest) -> Result<Uuid, AdminError> {
        req.validate()?;

        let incident = Incident {
            id: Uuid::new_v4(),
            lat: req.lat,
            lng: req.lng,
            radius_km: req.radius_km,
            status: req.status.unwrap_or(IncidentStatus::Active),
            created_at: Utc::now(),
        };
        self.repo.create(&incident).await?;
        tracing::info!(incident_id = %incident.id, status = %incident.status, "Incident created");

        self.refresh_snapshot().await;
        Ok(incident.id)
    }

    pub async fn list(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<ListIncidentsResponse, AdminError> {
        let page = page.unwrap_or(1).max(1);
        let limit = match limit {
            Some(l) if (1..=MAX_PAGE_LIMIT).contains(&l) => l,
            _ => DEFAULT_PAGE_LIMIT,
        };
        if (page - 1).checked_mul(limit).is_none() {
            return Err(AdminError::Validation("page is out of range".into()));
        }

        let (incidents, total) = self.repo.list(page, limit).await?;
        Ok(ListIncidentsResponse {
            incidents,
            page,
            limit,
            total,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<Incident, AdminError> {
        self.repo.get(id).await?.ok_or(AdminError::NotFound)
    }

    pub async fn update(&self, id: Uuid, req: UpdateIncidentRequest) -> Result<Incident, AdminError> {
        req.validate()?;

        let mut incident = self.get(id).await?;
        req.apply(&mut incident);

        if !self.repo.update(&incident).await? {
            return Err(AdminError::NotFound);
        }
        tracing::info!(incident_id = %id, status = %incident.status, "Incident updated");

        self.refresh_snapshot().await;
        Ok(incident)
    }

    /// 软删除，只对活跃事件生效
    pub async fn delete(&self, id: Uuid) -> Result<(), AdminError> {
        if !self.repo.deactivate(id).await? {
            return Err(AdminError::NotFound);
        }
        tracing::info!(incident_id = %id, "Incident deactivated");

        self.refresh_snapshot().await;
        Ok(())
    }

    async fn refresh_snapshot(&self) {
        if let Err(e) = self.refresher.refresh().await {
            tracing::error!(error = %e, "Failed to refresh incident snapshot after write");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::testing::{MemoryIncidentCache, MemoryIncidentRepository};

    struct Fixture {
        repo: Arc<MemoryIncidentRepository>,
        cache: Arc<MemoryIncidentCache>,
        service: AdminService,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryIncidentRepository::default());
        let cache = Arc::new(MemoryIncidentCache::default());
        let refresher = Arc::new(SnapshotRefresher::new(
            repo.clone(),
            cache.clone(),
            Duration::from_secs(300),
        ));
        let service = AdminService::new(repo.clone(), refresher);
        Fixture { repo, cache, service }
    }

    fn create_req(radius_km: f64) -> CreateIncidentRequest {
        CreateIncidentRequest {
            lat: 55.75,
            lng: 37.61,
            radius_km,
            status: None,
        }
    }

    #[tokio::test]
    async fn create_defaults_to_active_and_refreshes_snapshot() {
        let f = fixture();

        let id = f.service.create(create_req(1.0)).await.unwrap();

        assert_eq!(f.service.get(id).await.unwrap().status, IncidentStatus::Active);
        let snapshot = f.cache.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_repository() {
        let f = fixture();

        let err = f.service.create(create_req(250.0)).await.unwrap_err();

        assert!(matches!(err, AdminError::Validation(_)));
        assert_eq!(f.repo.writes.load(Ordering::SeqCst), 0);
        assert_eq!(f.cache.set_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deactivating_update_drops_incident_from_snapshot() {
        let f = fixture();
        let id = f.service.create(create_req(1.0)).await.unwrap();

        let updated = f
            .service
            .update(
                id,
                UpdateIncidentRequest {
                    status: Some(IncidentStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, IncidentStatus::Inactive);
        assert!(f.cache.snapshot().is_empty());
    }

    #[tokio::test]
    async fn delete_is_soft_and_only_once() {
        let f = fixture();
        let id = f.service.create(create_req(1.0)).await.unwrap();

        f.service.delete(id).await.unwrap();
        assert!(f.cache.snapshot().is_empty());
        assert_eq!(f.service.get(id).await.unwrap().status, IncidentStatus::Inactive);

        assert!(matches!(f.service.delete(id).await, Err(AdminError::NotFound)));
    }

    #[tokio::test]
    async fn snapshot_failure_does_not_fail_the_write() {
        let f = fixture();
        f.cache.fail.store(true, Ordering::SeqCst);

        let id = f.service.create(create_req(1.0)).await.unwrap();

        assert!(f.service.get(id).await.is_ok());
        assert_eq!(f.cache.set_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn list_clamps_paging() {
        let f = fixture();
        for _ in 0..3 {
            f.service.create(create_req(1.0)).await.unwrap();
        }

        let resp = f.service.list(Some(0), Some(500)).await.unwrap();

        assert_eq!(resp.page, 1);
        assert_eq!(resp.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(resp.total, 3);
        assert_eq!(resp.incidents.len(), 3);
    }

    #[tokio::test]
    async fn list_rejects_page_beyond_addressable_offset() {
        let f = fixture();
        f.service.create(create_req(1.0)).await.unwrap();

        let err = f.service.list(Some(i64::MAX), Some(20)).await.unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));

        // 最大不溢出的页码仍然可用，只是没有数据
        let last = i64::MAX / 20 + 1;
        let resp = f.service.list(Some(last), Some(20)).await.unwrap();
        assert!(resp.incidents.is_empty());
        assert_eq!(resp.total, 1);
    }

    #[tokio::test]
    async fn unknown_incident_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .update(Uuid::new_v4(), UpdateIncidentRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound));
    }
}
