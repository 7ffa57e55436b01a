use std::sync::Arc;

use crate::database::StatsRepository;
use crate::error::AdminError;
use crate::models::IncidentStats;

pub const DEFAULT_STATS_MINUTES: i64 = 60;
const MAX_STATS_MINUTES: i64 = 1440;

pub struct StatsService {
    repo: Arc<dyn StatsRepository>,
}

impl StatsService {
    pub fn new(repo: Arc<dyn StatsRepository>) -> Self {
        Self { repo }
    }

    /// 统计最近 `minutes` 分钟（1..=1440）内的检查情况
    pub async fn window_stats(&self, minutes: Option<i64>) -> Result<IncidentStats, AdminError> {
        let minutes = minutes.unwrap_or(DEFAULT_STATS_MINUTES);
        if !(1..=MAX_STATS_MINUTES).contains(&minutes) {
            return Err(AdminError::Validation(format!(
                "minutes must be within [1, {}]",
                MAX_STATS_MINUTES
            )));
        }

        let (unique_users, total_checks) = self.repo.window_stats(minutes).await?;
        Ok(IncidentStats {
            unique_users,
            total_checks,
            minutes,
        })
    }
}
