//! 事件管理的 HTTP 处理器

use crate::{
    auth::middleware::{AuthContext, MaybeAuthContext},
    error::AppError,
    middleware::{client_ip, AppState},
    models::{
        event::{CreateEventRequest, EventFilters, UpdateEventRequest},
        Pagination,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 首页：近期事件与总量统计
pub async fn home(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let response = state.event_service.home().await?;
    Ok(Json(response))
}

/// 公开事件列表（搜索/类型/状态过滤）
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<EventFilters>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let events = state
        .event_service
        .list(&filters, pagination.limit(50, 200), pagination.offset())
        .await?;
    let count = events.len();

    Ok(Json(json!({
        "events": events,
        "count": count
    })))
}

/// 事件详情（匿名可见，认证访问者附带报名与证书状态）
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    MaybeAuthContext(viewer): MaybeAuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.event_service.detail(id, viewer.as_ref()).await?;
    Ok(Json(detail))
}

/// 创建事件（仅组织者）
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let event = state.event_service.create(&auth_context, req, &ip).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Event created successfully",
            "event": event
        })),
    ))
}

/// 编辑事件（仅所属组织者）
pub async fn edit_event(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let event = state.event_service.update(&auth_context, id, req, &ip).await?;

    Ok(Json(json!({
        "message": "Event updated successfully",
        "event": event
    })))
}

/// 删除事件（仅所属组织者）
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    state.event_service.delete(&auth_context, id, &ip).await?;

    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

/// 事件报名名单（仅所属组织者）
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let participants = state.event_service.participants(&auth_context, id).await?;
    let count = participants.len();

    Ok(Json(json!({
        "participants": participants,
        "count": count
    })))
}

/// 仪表盘（按角色返回不同视图）
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let dashboard = state.event_service.dashboard(&auth_context).await?;
    Ok(Json(dashboard))
}
