use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CachedIncident, IncidentCache};
use crate::database::IncidentRepository;
use crate::error::RefreshError;

/// 从数据库读取全部活跃事件并整体写入快照缓存
///
/// 管理端写操作成功后和后台定时任务都调用同一个 [`SnapshotRefresher::refresh`]，
/// 两条路径之间不做协调，以最后一次写入为准。
pub struct SnapshotRefresher {
    source: Arc<dyn IncidentRepository>,
    cache: Arc<dyn IncidentCache>,
    ttl: Duration,
}

impl SnapshotRefresher {
    pub fn new(
        source: Arc<dyn IncidentRepository>,
        cache: Arc<dyn IncidentCache>,
        ttl: Duration,
    ) -> Self {
        Self { source, cache, ttl }
    }

    /// 返回写入快照的事件数量
    pub async fn refresh(&self) -> Result<usize, RefreshError> {
        let incidents = self.source.list_active().await?;
        let snapshot: Vec<CachedIncident> = incidents.iter().map(CachedIncident::from).collect();

        self.cache.set_active(&snapshot, self.ttl).await?;

        tracing::debug!(active = snapshot.len(), "Incident snapshot refreshed");
        Ok(snapshot.len())
    }
}
