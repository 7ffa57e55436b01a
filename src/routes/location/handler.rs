use std::time::Duration;

use axum::{Json, extract::State};

use crate::{
    AppState,
    error::AppError,
    models::{LocationCheckRequest, LocationCheckResponse},
    routes::location::model::NearbyRequest,
    services::NearbyIncident,
    utils::{ApiResponse, success_to_api_response},
};

const NEARBY_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

// 位置检查API
pub async fn check_location(
    State(state): State<AppState>,
    Json(request): Json<LocationCheckRequest>,
) -> Result<Json<ApiResponse<LocationCheckResponse>>, AppError> {
    let incidents = state
        .location
        .check_location(&request.user_id, request.lat, request.lng)
        .await?;

    Ok(success_to_api_response(LocationCheckResponse { incidents }))
}

// 附近事件API，返回距离等完整信息
pub async fn find_nearby_incidents(
    State(state): State<AppState>,
    Json(request): Json<NearbyRequest>,
) -> Result<Json<ApiResponse<Vec<NearbyIncident>>>, AppError> {
    let nearby = state
        .checker
        .submit(request.lat, request.lng, NEARBY_CHECK_TIMEOUT)
        .await?;

    Ok(success_to_api_response(nearby))
}
