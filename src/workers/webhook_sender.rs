use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use crate::cache::WebhookQueue;
use crate::error::{DeliveryError, QueueError};
use crate::models::WebhookPayload;

/// 阻塞弹出的等待时间
pub const DEFAULT_POP_TIMEOUT: Duration = Duration::from_secs(5);

/// 队列传输失败后的等待时间
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_millis(500);

/// 发送 webhook 的 HTTP 通道
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// 以 JSON 正文发起 POST，返回响应状态码
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<u16, DeliveryError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<u16, DeliveryError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        Ok(response.status().as_u16())
    }
}

/// 投递结果回调，用于在日志之外观察被丢弃的消息
pub trait DeliveryObserver: Send + Sync {
    fn on_delivered(&self, _payload: &WebhookPayload, _attempts: u32) {}

    /// 重试耗尽后消息被丢弃，不会重新入队
    fn on_dropped(&self, payload: &WebhookPayload, attempts: u32, last_error: &DeliveryError);

    fn on_abandoned(&self, _payload: &WebhookPayload, _attempts: u32) {}
}

pub struct NoopObserver;

impl DeliveryObserver for NoopObserver {
    fn on_dropped(&self, _payload: &WebhookPayload, _attempts: u32, _last_error: &DeliveryError) {}
}

/// 线性退避：第 n 次失败后等待 n * backoff_step
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Dropped { attempts: u32 },
    Abandoned { attempts: u32 },
}

/// 队列的唯一消费者：弹出消息并带重试地回调外部系统
pub struct WebhookSender {
    queue: Arc<dyn WebhookQueue>,
    transport: Arc<dyn WebhookTransport>,
    observer: Arc<dyn DeliveryObserver>,
    url: String,
    policy: RetryPolicy,
    pop_timeout: Duration,
    error_backoff: Duration,
}

impl WebhookSender {
    pub fn new(
        queue: Arc<dyn WebhookQueue>,
        transport: Arc<dyn WebhookTransport>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            queue,
            transport,
            observer: Arc::new(NoopObserver),
            url: url.into(),
            policy: RetryPolicy::default(),
            pop_timeout: DEFAULT_POP_TIMEOUT,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn DeliveryObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 主循环，直到取消信号触发
    pub async fn run(self, token: CancellationToken) {
        tracing::info!(url = %self.url, "Webhook sender started");

        loop {
            let popped = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                popped = self.queue.dequeue(self.pop_timeout) => popped,
            };

            match popped {
                Ok(None) => continue,
                Ok(Some(payload)) => {
                    tracing::info!(user_id = %payload.user_id, "Sending webhook");
                    self.deliver(&payload, &token).await;
                }
                Err(QueueError::Encoding(e)) => {
                    tracing::error!(error = %e, "Discarding undecodable webhook payload");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Webhook queue pop failed");
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(self.error_backoff) => {}
                    }
                }
            }
        }

        tracing::info!("Webhook sender stopped");
    }

    /// 投递单条消息，最多尝试 `max_attempts` 次
    pub async fn deliver(
        &self,
        payload: &WebhookPayload,
        token: &CancellationToken,
    ) -> DeliveryOutcome {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode webhook payload");
                self.observer.on_dropped(payload, 0, &DeliveryError::Encoding(e));
                return DeliveryOutcome::Dropped { attempts: 0 };
            }
        };

        let mut attempt = 1;
        loop {
            if token.is_cancelled() {
                return self.abandon(payload, attempt - 1);
            }

            let error = match self.transport.post_json(&self.url, body.clone()).await {
                Ok(status) if (200..300).contains(&status) => {
                    tracing::info!(user_id = %payload.user_id, attempt, "Webhook delivered");
                    self.observer.on_delivered(payload, attempt);
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Ok(status) => DeliveryError::Status(status),
                Err(e) => e,
            };

            tracing::warn!(attempt, url = %self.url, reason = %error, "Webhook delivery failed");

            if attempt >= self.policy.max_attempts {
                tracing::error!(
                    user_id = %payload.user_id,
                    attempts = attempt,
                    reason = %error,
                    "Webhook dropped after max attempts"
                );
                self.observer.on_dropped(payload, attempt, &error);
                return DeliveryOutcome::Dropped { attempts: attempt };
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => return self.abandon(payload, attempt),
                _ = tokio::time::sleep(self.policy.backoff(attempt)) => {}
            }
            attempt += 1;
        }
    }

    fn abandon(&self, payload: &WebhookPayload, attempts: u32) -> DeliveryOutcome {
        tracing::info!(user_id = %payload.user_id, attempts, "Stop webhook retries due to shutdown");
        self.observer.on_abandoned(payload, attempts);
        DeliveryOutcome::Abandoned { attempts }
    }
}
