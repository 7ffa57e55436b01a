use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::ACTIVE_INCIDENTS_KEY;
use crate::cache::models::CachedIncident;
use crate::error::CacheError;

/// 活跃事件快照的读写接口
///
/// 键不存在与空列表等价，都返回空快照；只有传输层失败才返回错误。
#[async_trait]
pub trait IncidentCache: Send + Sync {
    async fn get_active(&self) -> Result<Vec<CachedIncident>, CacheError>;

    async fn set_active(&self, incidents: &[CachedIncident], ttl: Duration)
    -> Result<(), CacheError>;
}

/// 基于 Redis 单键的快照存储，整体替换，不做局部修改
pub struct IncidentCacheOperations {
    redis_client: Arc<RedisClient>,
    key: String,
}

impl IncidentCacheOperations {
    /// 创建新的快照缓存操作实例
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self {
            redis_client,
            key: ACTIVE_INCIDENTS_KEY.to_string(),
        }
    }
}

#[async_trait]
impl IncidentCache for IncidentCacheOperations {
    async fn get_active(&self) -> Result<Vec<CachedIncident>, CacheError> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(&self.key).await?;

        match result {
            Some(json) => {
                let incidents: Vec<CachedIncident> = serde_json::from_str(&json)?;
                tracing::debug!(count = incidents.len(), "Loaded active incidents from cache");
                Ok(incidents)
            }
            None => {
                tracing::debug!("Active incident snapshot missing, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn set_active(
        &self,
        incidents: &[CachedIncident],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;

        let json = serde_json::to_string(incidents)?;

        // SET EX 不接受 0 秒
        let ttl_secs = ttl.as_secs().max(1);
        let _: () = conn.set_ex(&self.key, json, ttl_secs).await?;

        tracing::debug!(count = incidents.len(), ttl_secs, "Stored active incident snapshot");
        Ok(())
    }
}
