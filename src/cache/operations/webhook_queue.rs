use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, AsyncConnectionConfig, Client as RedisClient};
use tokio::sync::Mutex;

use crate::cache::keys::WEBHOOK_QUEUE_KEY;
use crate::error::QueueError;
use crate::models::WebhookPayload;

/// 阻塞弹出连接的响应超时需要比 BRPOP 超时多出的余量
const POP_RESPONSE_MARGIN: Duration = Duration::from_secs(2);

/// webhook 投递队列
///
/// 写入端不等待消费者；读取端阻塞弹出，超时返回 `Ok(None)` 而不是错误。
/// 弹出即删除，投递前进程退出会丢失该条消息。
#[async_trait]
pub trait WebhookQueue: Send + Sync {
    async fn enqueue(&self, payload: &WebhookPayload) -> Result<(), QueueError>;

    async fn dequeue(&self, timeout: Duration) -> Result<Option<WebhookPayload>, QueueError>;
}

/// 基于 Redis 列表的 FIFO 队列：LPUSH 写入，BRPOP 读取
pub struct RedisWebhookQueue {
    redis_client: Arc<RedisClient>,
    key: String,
    // BRPOP 独占一条连接，避免阻塞其他命令
    pop_conn: Mutex<Option<MultiplexedConnection>>,
}

impl RedisWebhookQueue {
    pub fn new(redis_client: Arc<RedisClient>) -> Self {
        Self::with_key(redis_client, WEBHOOK_QUEUE_KEY)
    }

    pub fn with_key(redis_client: Arc<RedisClient>, key: &str) -> Self {
        Self {
            redis_client,
            key: key.to_string(),
            pop_conn: Mutex::new(None),
        }
    }

    async fn pop_connection(
        &self,
        timeout: Duration,
    ) -> Result<MultiplexedConnection, redis::RedisError> {
        let mut slot = self.pop_conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let config = AsyncConnectionConfig::new().set_response_timeout(timeout + POP_RESPONSE_MARGIN);
        let conn = self
            .redis_client
            .get_multiplexed_async_connection_with_config(&config)
            .await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset_pop_connection(&self) {
        *self.pop_conn.lock().await = None;
    }
}

#[async_trait]
impl WebhookQueue for RedisWebhookQueue {
    async fn enqueue(&self, payload: &WebhookPayload) -> Result<(), QueueError> {
        let json = serde_json::to_string(payload)?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.lpush(&self.key, json).await?;

        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<WebhookPayload>, QueueError> {
        let mut conn = self.pop_connection(timeout).await?;

        let popped: Option<(String, String)> = match redis::cmd("BRPOP")
            .arg(&self.key)
            .arg(brpop_timeout_secs(timeout))
            .query_async(&mut conn)
            .await
        {
            Ok(popped) => popped,
            Err(e) => {
                // 连接可能已失效，下次重新建立
                self.reset_pop_connection().await;
                return Err(e.into());
            }
        };

        match popped {
            Some((_key, json)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

/// BRPOP 超时按整秒发送，旧版 Redis 不接受小数；0 表示永久阻塞，最少 1 秒
fn brpop_timeout_secs(timeout: Duration) -> u64 {
    timeout.as_secs().max(1)
}
