use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError};

pub const API_KEY_HEADER: &str = "x-api-key";

/// 后台管理接口的 API Key 校验
pub async fn api_key_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(key) if !state.config.api_key.is_empty() && key == state.config.api_key => {
            Ok(next.run(req).await)
        }
        _ => {
            tracing::warn!(path = %req.uri().path(), "Rejected admin request with bad API key");
            Err(AppError::Unauthorized)
        }
    }
}
