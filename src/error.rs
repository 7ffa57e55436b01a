use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::utils::{ApiResponse, error_codes};

/// 位置检查对外暴露的错误
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("invalid coordinates")]
    InvalidCoordinates,
    #[error("invalid user_id")]
    InvalidUserId,
    #[error("incident cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),
}

/// 快照缓存错误：区分"传输不可用"和"数据损坏"，空快照不是错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis transport error: {0}")]
    Transport(#[from] redis::RedisError),
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// 通知队列错误
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("redis transport error: {0}")]
    Transport(#[from] redis::RedisError),
    #[error("webhook payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// 单次 webhook 投递失败的原因
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook responded with status {0}")]
    Status(u16),
    #[error("webhook payload encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// 快照刷新错误
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to list active incidents: {0}")]
    Source(#[from] sqlx::Error),
    #[error("failed to store snapshot: {0}")]
    Cache(#[from] CacheError),
}

/// 后台管理接口错误
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("incident not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// 工作池错误
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("location checker is shut down")]
    Closed,
    #[error("location check timed out")]
    Timeout,
    #[error(transparent)]
    Check(#[from] CheckError),
}

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    BadRequest(String),
    NotFound(String),
    ServiceUnavailable(String),
    InternalServerError,
}

impl From<CheckError> for AppError {
    fn from(err: CheckError) -> Self {
        match err {
            CheckError::InvalidCoordinates | CheckError::InvalidUserId => {
                AppError::BadRequest(err.to_string())
            }
            CheckError::CacheUnavailable(_) => AppError::ServiceUnavailable(err.to_string()),
        }
    }
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Validation(msg) => AppError::BadRequest(msg),
            AdminError::NotFound => AppError::NotFound(err.to_string()),
            AdminError::Database(e) => {
                tracing::error!("Admin database error: {}", e);
                AppError::InternalServerError
            }
        }
    }
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Check(e) => e.into(),
            PoolError::Closed | PoolError::Timeout => AppError::ServiceUnavailable(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "unauthorized".to_string(),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::UNAVAILABLE,
                msg,
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "internal server error".to_string(),
            ),
        };

        let body = Json(ApiResponse::<()> {
            code,
            msg,
            resp_data: None,
        });

        (status, body).into_response()
    }
}
