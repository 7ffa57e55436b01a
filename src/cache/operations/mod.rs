/// 缓存操作
/// 提供快照读写与队列收发的实现

// 活跃事件快照
pub mod incident;

// webhook 投递队列
pub mod webhook_queue;

pub use incident::{IncidentCache, IncidentCacheOperations};
pub use webhook_queue::{RedisWebhookQueue, WebhookQueue};
