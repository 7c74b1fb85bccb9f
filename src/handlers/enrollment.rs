//! 报名的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::{client_ip, AppState},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 报名某个事件
pub async fn create_enrollment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let enrollment = state
        .enrollment_service
        .enroll(&auth_context, event_id, &ip, false)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Enrollment successful",
            "enrollment": enrollment
        })),
    ))
}

/// 取消自己的报名
pub async fn cancel_enrollment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let enrollment = state.enrollment_service.cancel(&auth_context, id, &ip).await?;

    Ok(Json(json!({
        "message": "Enrollment cancelled successfully",
        "enrollment": enrollment
    })))
}

/// 我的报名列表（含已取消）
pub async fn my_enrollments(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let enrollments = state.enrollment_service.my_enrollments(&auth_context).await?;
    let count = enrollments.len();

    Ok(Json(json!({
        "enrollments": enrollments,
        "count": count
    })))
}
