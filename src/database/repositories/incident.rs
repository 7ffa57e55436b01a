// 事件存储库
// 包含事件相关的数据库操作

use async_trait::async_trait;
use sqlx::{Error as SqlxError, PgPool};
use uuid::Uuid;

use crate::models::{Incident, IncidentRow};

/// 事件的持久化接口，由管理端和快照刷新共用
#[async_trait]
pub trait IncidentRepository: Send + Sync {
    async fn create(&self, incident: &Incident) -> Result<(), SqlxError>;

    /// 分页列出事件，返回 (当前页, 总数)
    async fn list(&self, page: i64, limit: i64) -> Result<(Vec<Incident>, i64), SqlxError>;

    async fn get(&self, id: Uuid) -> Result<Option<Incident>, SqlxError>;

    /// 返回是否有行被更新
    async fn update(&self, incident: &Incident) -> Result<bool, SqlxError>;

    /// 软删除：仅将活跃事件置为 inactive，返回是否有行被更新
    async fn deactivate(&self, id: Uuid) -> Result<bool, SqlxError>;

    async fn list_active(&self) -> Result<Vec<Incident>, SqlxError>;
}

/// Postgres 事件存储库
pub struct PgIncidentRepository {
    db: PgPool,
}

impl PgIncidentRepository {
    /// 创建新的事件存储库实例
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_incidents(rows: Vec<IncidentRow>) -> Result<Vec<Incident>, SqlxError> {
    rows.into_iter().map(Incident::try_from).collect()
}

#[async_trait]
impl IncidentRepository for PgIncidentRepository {
    async fn create(&self, incident: &Incident) -> Result<(), SqlxError> {
        sqlx::query(
            r#"
            INSERT INTO incidents (id, latitude, longitude, radius_km, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(incident.id)
        .bind(incident.lat)
        .bind(incident.lng)
        .bind(incident.radius_km)
        .bind(incident.status.as_str())
        .bind(incident.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list(&self, page: i64, limit: i64) -> Result<(Vec<Incident>, i64), SqlxError> {
        let offset = (page - 1).saturating_mul(limit);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM incidents")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, IncidentRow>(
            r#"
            SELECT id, latitude, longitude, radius_km, status, created_at
            FROM incidents
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok((into_incidents(rows)?, total))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Incident>, SqlxError> {
        let row = sqlx::query_as::<_, IncidentRow>(
            r#"
            SELECT id, latitude, longitude, radius_km, status, created_at
            FROM incidents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Incident::try_from).transpose()
    }

    async fn update(&self, incident: &Incident) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            r#"
            UPDATE incidents
            SET latitude = $2, longitude = $3, radius_km = $4, status = $5
            WHERE id = $1
            "#,
        )
        .bind(incident.id)
        .bind(incident.lat)
        .bind(incident.lng)
        .bind(incident.radius_km)
        .bind(incident.status.as_str())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool, SqlxError> {
        let result = sqlx::query(
            r#"
            UPDATE incidents
            SET status = 'inactive'
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_active(&self) -> Result<Vec<Incident>, SqlxError> {
        let rows = sqlx::query_as::<_, IncidentRow>(
            r#"
            SELECT id, latitude, longitude, radius_km, status, created_at
            FROM incidents
            WHERE status = 'active'
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        into_incidents(rows)
    }
}
