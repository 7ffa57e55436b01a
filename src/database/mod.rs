// 数据库模块
// 包含表结构初始化和存储库操作

pub mod repositories;

pub use repositories::{
    CheckRecorder, IncidentRepository, LocationCheckRepository, PgIncidentRepository,
    StatsRepository,
};

use sqlx::PgPool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS incidents (
        id          UUID PRIMARY KEY,
        latitude    DOUBLE PRECISION NOT NULL,
        longitude   DOUBLE PRECISION NOT NULL,
        radius_km   DOUBLE PRECISION NOT NULL,
        status      TEXT NOT NULL DEFAULT 'active',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS incidents_status_idx ON incidents (status)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS location_checks (
        id            UUID PRIMARY KEY,
        user_id       UUID NOT NULL,
        latitude      DOUBLE PRECISION NOT NULL,
        longitude     DOUBLE PRECISION NOT NULL,
        incident_ids  UUID[] NOT NULL DEFAULT '{}',
        checked_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS location_checks_checked_at_idx ON location_checks (checked_at)
    "#,
];

/// 启动时创建所需的表，已存在则跳过
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Database schema ready");
    Ok(())
}
