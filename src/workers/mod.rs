//! 后台任务
//!
//! 所有长期运行的循环都通过 [`TaskRegistry`] 启动，关闭时统一取消并等待退出，
//! 之后才释放 Redis / Postgres 等共享资源。

pub mod location_checker;
pub mod webhook_sender;

pub use location_checker::{LocationChecker, LocationCheckerHandle, SnapshotRefreshTask};
pub use webhook_sender::{
    DeliveryObserver, DeliveryOutcome, NoopObserver, ReqwestTransport, RetryPolicy,
    WebhookSender, WebhookTransport,
};

use std::future::Future;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 后台任务登记表，持有每个任务的句柄和共享的取消信号
pub struct TaskRegistry {
    token: CancellationToken,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl TaskRegistry {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            tasks: Vec::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        tracing::info!(task = %name, "Background task started");
        self.tasks.push((name, tokio::spawn(task)));
    }

    /// 发出取消信号并等待所有任务退出
    pub async fn shutdown(self) {
        tracing::info!(tasks = self.len(), "Stopping background tasks");
        self.token.cancel();

        let (names, handles): (Vec<_>, Vec<_>) = self.tasks.into_iter().unzip();
        let results = join_all(handles).await;

        for (name, result) in names.into_iter().zip(results) {
            match result {
                Ok(()) => tracing::info!(task = %name, "Background task stopped"),
                Err(e) => tracing::error!(task = %name, error = %e, "Background task panicked"),
            }
        }
    }
}
