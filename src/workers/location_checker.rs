use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cache::IncidentCache;
use crate::error::{CheckError, PoolError};
use crate::services::{NearbyIncident, SnapshotRefresher, find_nearby};
use crate::utils::is_valid_coordinate;

use super::TaskRegistry;

/// 快照定时刷新间隔
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

type CheckResult = Result<Vec<NearbyIncident>, CheckError>;

struct CheckJob {
    lat: f64,
    lng: f64,
    respond_to: oneshot::Sender<CheckResult>,
    deadline: Instant,
}

/// 固定大小的位置匹配工作池
///
/// 同时进行的匹配不超过 `pool_size` 个；每个任务的结果只会发回提交者自己的通道，
/// 超时或提交者放弃后结果直接丢弃，不阻塞 worker。
pub struct LocationChecker {
    cache: Arc<dyn IncidentCache>,
    jobs: Arc<Mutex<mpsc::Receiver<CheckJob>>>,
    pool_size: usize,
    token: CancellationToken,
}

/// 向工作池提交任务的句柄，可随意克隆
#[derive(Clone)]
pub struct LocationCheckerHandle {
    jobs: mpsc::Sender<CheckJob>,
    token: CancellationToken,
}

impl LocationChecker {
    pub fn new(
        cache: Arc<dyn IncidentCache>,
        pool_size: usize,
        queue_capacity: usize,
        token: CancellationToken,
    ) -> (Self, LocationCheckerHandle) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let checker = Self {
            cache,
            jobs: Arc::new(Mutex::new(rx)),
            pool_size: pool_size.max(1),
            token: token.clone(),
        };
        (checker, LocationCheckerHandle { jobs: tx, token })
    }

    /// 启动全部 worker，由登记表负责关闭
    pub fn spawn(self, registry: &mut TaskRegistry) {
        for id in 0..self.pool_size {
            let cache = self.cache.clone();
            let jobs = self.jobs.clone();
            let token = self.token.clone();
            registry.spawn(format!("location-worker-{id}"), worker(id, cache, jobs, token));
        }
    }
}

async fn worker(
    id: usize,
    cache: Arc<dyn IncidentCache>,
    jobs: Arc<Mutex<mpsc::Receiver<CheckJob>>>,
    token: CancellationToken,
) {
    loop {
        let job = {
            let mut rx = jobs.lock().await;
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                job = rx.recv() => job,
            }
        };

        let Some(job) = job else { break };
        process_job(cache.as_ref(), job).await;
    }

    tracing::debug!(worker = id, "Location worker stopped");
}

async fn process_job(cache: &dyn IncidentCache, job: CheckJob) {
    if job.respond_to.is_closed() {
        tracing::debug!("Location check caller gone before processing");
        return;
    }

    let result = match cache.get_active().await {
        Ok(incidents) => Ok(find_nearby(job.lat, job.lng, &incidents)),
        Err(e) => {
            tracing::warn!(error = %e, "Location worker failed to read snapshot");
            Err(CheckError::from(e))
        }
    };

    if Instant::now() >= job.deadline {
        tracing::debug!("Discarding expired location check result");
        return;
    }
    if job.respond_to.send(result).is_err() {
        tracing::debug!("Location check caller gone, result discarded");
    }
}

impl LocationCheckerHandle {
    /// 提交一次匹配并等待结果，整体耗时不超过 `timeout`
    pub async fn submit(
        &self,
        lat: f64,
        lng: f64,
        timeout: Duration,
    ) -> Result<Vec<NearbyIncident>, PoolError> {
        if !is_valid_coordinate(lat, lng) {
            return Err(CheckError::InvalidCoordinates.into());
        }
        if self.token.is_cancelled() {
            return Err(PoolError::Closed);
        }

        let deadline = Instant::now() + timeout;
        let (tx, rx) = oneshot::channel();
        let job = CheckJob {
            lat,
            lng,
            respond_to: tx,
            deadline,
        };

        match tokio::time::timeout_at(deadline, self.jobs.send(job)).await {
            Err(_) => return Err(PoolError::Timeout),
            Ok(Err(_)) => return Err(PoolError::Closed),
            Ok(Ok(())) => {}
        }

        match tokio::time::timeout_at(deadline, rx).await {
            Err(_) => Err(PoolError::Timeout),
            Ok(Err(_)) => Err(PoolError::Closed),
            Ok(Ok(result)) => Ok(result?),
        }
    }
}

/// 定时刷新活跃事件快照，失败只记日志
pub struct SnapshotRefreshTask {
    refresher: Arc<SnapshotRefresher>,
    interval: Duration,
}

impl SnapshotRefreshTask {
    pub fn new(refresher: Arc<SnapshotRefresher>, interval: Duration) -> Self {
        Self {
            refresher,
            interval,
        }
    }

    pub async fn run(self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        // 跳过立即触发的第一次
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    match self.refresher.refresh().await {
                        Ok(active) => tracing::debug!(active, "Periodic snapshot refresh done"),
                        Err(e) => tracing::warn!(error = %e, "Periodic snapshot refresh failed"),
                    }
                }
            }
        }

        tracing::info!("Snapshot refresh task stopped");
    }
}
