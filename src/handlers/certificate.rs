//! 证书的 HTTP 处理器

use crate::{
    auth::middleware::{AuthContext, MaybeAuthContext},
    error::AppError,
    middleware::{client_ip, AppState},
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    pub codigo: Option<String>,
}

/// 签发证书（仅事件所属组织者）
pub async fn issue_certificate(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
    Path(enrollment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let certificate = state
        .certificate_service
        .issue(&auth_context, enrollment_id, &ip)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Certificate issued successfully",
            "certificate": certificate
        })),
    ))
}

/// 我的证书列表
pub async fn my_certificates(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let certificates = state.certificate_service.my_certificates(&auth_context).await?;
    let count = certificates.len();

    Ok(Json(json!({
        "certificates": certificates,
        "count": count
    })))
}

/// 下载证书文档（仅证书归属的参与者）
pub async fn download_certificate(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let certificate = state.certificate_service.download(&auth_context, id).await?;

    Ok(Json(certificate))
}

/// 公开验证：按验证码查询证书
pub async fn validate_certificate(
    State(state): State<Arc<AppState>>,
    MaybeAuthContext(viewer): MaybeAuthContext,
    headers: HeaderMap,
    Query(params): Query<ValidateParams>,
) -> Result<impl IntoResponse, AppError> {
    let code = params
        .codigo
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Query parameter 'codigo' is required"))?;

    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let result = state
        .certificate_service
        .verify(code.trim(), viewer.as_ref(), &ip)
        .await?;

    Ok(Json(result))
}
