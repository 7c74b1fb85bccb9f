//! REST API 处理器
//! Bearer 令牌认证，事件查询与报名操作受每日配额限制

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::{client_ip, AppState},
    models::{auth::ApiTokenRequest, enrollment::CreateEnrollmentRequest, Pagination},
    services::{audit_service::AuditAction, QuotaScope},
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

/// API 登录：签发 Bearer 访问令牌
pub async fn api_login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ApiTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let token = state.auth_service.issue_api_token(req, &ip).await?;

    Ok(Json(token))
}

/// 事件列表：有效且尚未开始的事件（配额 20/天）
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    state
        .quota_service
        .check_and_count(auth_context.user_id, QuotaScope::EventQuery)
        .await?;

    let limit = pagination.limit(20, 100);
    let offset = pagination.offset();

    let events = state.event_service.list_upcoming(limit, offset).await?;
    let count = events.len();

    record_query_audit(
        &state,
        &auth_context,
        &headers,
        format!("Event list queried via API ({} results)", count),
        json!({ "total_results": count, "limit": limit, "offset": offset }),
    )
    .await;

    Ok(Json(json!({
        "events": events,
        "count": count,
        "limit": limit,
        "offset": offset
    })))
}

/// 事件详情（配额 20/天，与列表共享）
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .quota_service
        .check_and_count(auth_context.user_id, QuotaScope::EventQuery)
        .await?;

    let event = state.event_service.detail_upcoming(id).await?;

    record_query_audit(
        &state,
        &auth_context,
        &headers,
        format!("Event {} queried via API", id),
        json!({ "event_id": id }),
    )
    .await;

    Ok(Json(event))
}

/// 我的有效报名列表
pub async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let enrollments = state
        .enrollment_service
        .my_active_enrollments(&auth_context)
        .await?;
    let count = enrollments.len();

    Ok(Json(json!({
        "enrollments": enrollments,
        "count": count
    })))
}

/// 创建报名（配额 50/天）
pub async fn create_enrollment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Json(req): Json<CreateEnrollmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .quota_service
        .check_and_count(auth_context.user_id, QuotaScope::EnrollmentCreate)
        .await?;

    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let enrollment = state
        .enrollment_service
        .enroll(&auth_context, req.event_id, &ip, true)
        .await?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// 取消报名（仅本人；事件结束后不可取消）
pub async fn cancel_enrollment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    state
        .enrollment_service
        .api_cancel(&auth_context, id, &ip)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// API 查询审计：失败只告警，不影响响应
async fn record_query_audit(
    state: &AppState,
    auth_context: &AuthContext,
    headers: &HeaderMap,
    description: String,
    payload: serde_json::Value,
) {
    let ip = client_ip(headers, state.config.security.trust_proxy);

    if let Err(err) = state
        .audit_service
        .record(
            Some((auth_context.user_id, &auth_context.username)),
            AuditAction::ApiEventQuery,
            description,
            Some(&ip),
            Some(payload),
        )
        .await
    {
        tracing::warn!(error = %err, "Failed to write API query audit record");
    }
}
