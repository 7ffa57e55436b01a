use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    AppState,
    error::AppError,
    models::{
        CreateIncidentRequest, Incident, IncidentStats, ListIncidentsResponse, StatsQuery,
        UpdateIncidentRequest,
    },
    routes::incident::model::{IncidentIdResponse, ListQuery},
    utils::{ApiResponse, success_to_api_response},
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

// 创建事件API
pub async fn create_incident(
    State(state): State<AppState>,
    Json(request): Json<CreateIncidentRequest>,
) -> ApiResult<IncidentIdResponse> {
    let id = state.admin.create(request).await?;
    Ok(success_to_api_response(IncidentIdResponse { id }))
}

// 分页列出事件API
pub async fn list_incidents(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<ListIncidentsResponse> {
    let page = state.admin.list(query.page, query.limit).await?;
    Ok(success_to_api_response(page))
}

pub async fn get_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Incident> {
    let incident = state.admin.get(id).await?;
    Ok(success_to_api_response(incident))
}

pub async fn update_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIncidentRequest>,
) -> ApiResult<Incident> {
    let incident = state.admin.update(id, request).await?;
    Ok(success_to_api_response(incident))
}

// 软删除事件API
pub async fn delete_incident(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<IncidentIdResponse> {
    state.admin.delete(id).await?;
    Ok(success_to_api_response(IncidentIdResponse { id }))
}

// 检查统计API
pub async fn incident_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<IncidentStats> {
    let stats = state.stats.window_stats(query.minutes).await?;
    Ok(success_to_api_response(stats))
}
