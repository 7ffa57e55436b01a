use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub api_key: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub webhook_url: String,
    pub webhook_disabled: bool,
    pub webhook_timeout_secs: u64,
    pub webhook_max_attempts: u32,
    pub cache_ttl_secs: u64,
    pub cache_refresh_interval_secs: u64,
    pub worker_pool_size: usize,
    pub worker_queue_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 从任意键值来源构建配置，必填项缺失时报错，其余使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, env::VarError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| lookup(name).ok_or(env::VarError::NotPresent);

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            api_key: required("API_KEY")?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(&lookup, "SERVER_PORT", 3000),
            api_base_uri: lookup("API_BASE_URI").unwrap_or_else(|| "/api/v1".into()),
            rate_limit_window_secs: parse_or(&lookup, "RATE_LIMIT_WINDOW", 60),
            rate_limit_requests: parse_or(&lookup, "RATE_LIMIT_REQUESTS", 100),
            webhook_url: lookup("WEBHOOK_URL").unwrap_or_default(),
            webhook_disabled: parse_or(&lookup, "WEBHOOK_DISABLED", false),
            webhook_timeout_secs: parse_or(&lookup, "WEBHOOK_TIMEOUT_SECS", 5),
            webhook_max_attempts: parse_or(&lookup, "WEBHOOK_MAX_ATTEMPTS", 3),
            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL_SECS", 300),
            cache_refresh_interval_secs: parse_or(&lookup, "CACHE_REFRESH_INTERVAL_SECS", 30),
            worker_pool_size: parse_or(&lookup, "WORKER_POOL_SIZE", 4),
            worker_queue_capacity: parse_or(&lookup, "WORKER_QUEUE_CAPACITY", 100),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    /// 快照 TTL 至少 1 秒
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_interval_secs.max(1))
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(name, value = %raw, "Invalid config value, using default");
            default
        }),
        None => default,
    }
}
