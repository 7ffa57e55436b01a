/// 活跃事件快照缓存键
pub const ACTIVE_INCIDENTS_KEY: &str = "incidents:active";

/// webhook 投递队列键
pub const WEBHOOK_QUEUE_KEY: &str = "webhooks:queue";

/// 限流计数键前缀
const RATE_LIMIT_PREFIX: &str = "rate_limit:";

/// 生成限流计数键
pub fn rate_limit_key(ip: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, ip)
}
