/// 缓存键模块
/// 提供各种缓存键常量和生成函数
pub mod incident_keys;

pub use incident_keys::{ACTIVE_INCIDENTS_KEY, WEBHOOK_QUEUE_KEY, rate_limit_key};
