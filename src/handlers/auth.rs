//! 认证相关的 HTTP 处理器
//! 注册、登录、登出与邮箱确认

use crate::{
    auth::middleware::{extract_session_token, AuthContext, SESSION_COOKIE},
    error::AppError,
    middleware::{client_ip, AppState},
    models::{auth::LoginRequest, user::RegisterRequest},
};
use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 注册新用户
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let user = state.auth_service.register(req, &ip).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful. Confirm your email before logging in.",
            "user": user
        })),
    ))
}

/// 登录：返回会话令牌并写入 Cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let response = state.auth_service.login(req, &ip, user_agent.as_deref()).await?;

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, response.session_token, state.config.security.session_ttl_secs
    );

    Ok(([(SET_COOKIE, cookie)], Json(response)))
}

/// 登出：撤销当前会话并清除 Cookie
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = extract_session_token(&headers).ok_or(AppError::Unauthorized)?;

    state
        .auth_service
        .logout(&token, auth_context.user_id, &auth_context.username)
        .await?;

    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);

    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

/// 邮箱确认
pub async fn confirm_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ip = client_ip(&headers, state.config.security.trust_proxy);

    let user = state.auth_service.confirm_email(&token, &ip).await?;

    Ok(Json(json!({
        "message": "Email confirmed successfully. You can now log in.",
        "user": user
    })))
}
