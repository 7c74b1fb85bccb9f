//! 审计日志的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::{audit::AuditLogFilters, Pagination},
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 审计日志列表（仅组织者）
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Query(filters): Query<AuditLogFilters>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    if !auth_context.is_organizer() {
        return Err(AppError::Forbidden);
    }

    let limit = pagination.limit(50, 200);
    let offset = pagination.offset();

    let logs = state.audit_service.query_logs(&filters, limit, offset).await?;
    let total = state.audit_service.count_logs(&filters).await?;

    Ok(Json(json!({
        "logs": logs,
        "total": total,
        "limit": limit,
        "offset": offset
    })))
}
