// 位置检查存储库
// 写入检查记录并提供时间窗口统计

use async_trait::async_trait;
use sqlx::{Error as SqlxError, PgPool};

use crate::models::LocationCheck;

/// 检查记录的写入接口
#[async_trait]
pub trait CheckRecorder: Send + Sync {
    async fn save_check(&self, check: &LocationCheck) -> Result<(), SqlxError>;
}

/// 检查记录的统计接口
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// 返回最近 `minutes` 分钟内的 (去重用户数, 检查总数)
    async fn window_stats(&self, minutes: i64) -> Result<(i64, i64), SqlxError>;
}

pub struct LocationCheckRepository {
    db: PgPool,
}

impl LocationCheckRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CheckRecorder for LocationCheckRepository {
    async fn save_check(&self, check: &LocationCheck) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            INSERT INTO location_checks (id, user_id, latitude, longitude, incident_ids, checked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(check.id)
        .bind(check.user_id)
        .bind(check.lat)
        .bind(check.lng)
        .bind(&check.incident_ids)
        .bind(check.checked_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StatsRepository for LocationCheckRepository {
    async fn window_stats(&self, minutes: i64) -> Result<(i64, i64), SqlxError> {
        let stats: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT user_id), COUNT(*)
            FROM location_checks
            WHERE checked_at >= NOW() - ($1 * INTERVAL '1 minute')
            "#,
        )
        .bind(minutes as f64)
        .fetch_one(&self.db)
        .await?;

        Ok(stats)
    }
}
