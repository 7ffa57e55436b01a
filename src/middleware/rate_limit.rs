use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::{
    cache::keys::rate_limit_key,
    config::Config,
    utils::{error_codes, error_to_api_response},
};

/// 基于 Redis INCR + EXPIRE 的固定窗口限流
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
}

impl RateLimiter {
    pub fn new(redis: Arc<redis::Client>, config: Config) -> Self {
        Self {
            redis,
            config: Arc::new(config),
        }
    }

    pub async fn check_rate_limit(self: Arc<Self>, req: Request<Body>, next: Next) -> Response {
        let ip = client_ip(&req);

        match self.hit(&ip).await {
            Ok(count) if count > self.config.rate_limit_requests as i64 => {
                tracing::warn!(ip = %ip, count, "Rate limit exceeded");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    error_to_api_response::<()>(
                        error_codes::RATE_LIMIT,
                        format!(
                            "too many requests, retry in {} seconds",
                            self.config.rate_limit_window().as_secs()
                        ),
                    ),
                )
                    .into_response()
            }
            Ok(_) => next.run(req).await,
            Err(e) => {
                // Redis 不可用时放行
                tracing::warn!(ip = %ip, error = %e, "Rate limiter unavailable, letting request through");
                next.run(req).await
            }
        }
    }

    async fn hit(&self, ip: &str) -> Result<i64, redis::RedisError> {
        let key = rate_limit_key(ip);
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let (count, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .ttl(&key)
            .query_async(&mut conn)
            .await?;

        // 上次 EXPIRE 失败时键会永久存在，这里补上
        if needs_expiry(ttl) {
            let _: () = conn
                .expire(&key, self.config.rate_limit_window().as_secs() as i64)
                .await?;
        }
        Ok(count)
    }
}

/// TTL 为 -1 表示计数键存在但没有过期时间
fn needs_expiry(ttl: i64) -> bool {
    ttl == -1
}

/// 优先取代理头，其次连接地址
fn client_ip(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn counter_without_ttl_gets_expiry() {
        assert!(needs_expiry(-1));
        assert!(!needs_expiry(60));
        assert!(!needs_expiry(0));
        assert!(!needs_expiry(-2));
    }

    #[test]
    fn prefers_real_ip_header() {
        let req = request(&[("x-real-ip", "10.0.0.1"), ("x-forwarded-for", "10.0.0.2")]);
        assert_eq!(client_ip(&req), "10.0.0.1");
    }

    #[test]
    fn falls_back_to_first_forwarded_address() {
        let req = request(&[("x-forwarded-for", " 10.0.0.2 , 10.0.0.3")]);
        assert_eq!(client_ip(&req), "10.0.0.2");
    }

    #[test]
    fn uses_connect_info_then_unknown() {
        let mut req = request(&[]);
        assert_eq!(client_ip(&req), "unknown");

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_ip(&req), "127.0.0.1");
    }
}
