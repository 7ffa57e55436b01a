// 缓存模块
// 包含活跃事件快照和 webhook 队列两类 Redis 数据

pub mod keys;
pub mod models;
pub mod operations;

pub use models::CachedIncident;
pub use operations::{IncidentCache, IncidentCacheOperations, RedisWebhookQueue, WebhookQueue};
