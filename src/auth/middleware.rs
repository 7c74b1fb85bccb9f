//! 认证中间件
//! Web 路由走会话 Cookie，API 路由走 Bearer JWT

use crate::{
    auth::jwt::JwtService,
    error::AppError,
    middleware::AppState,
    models::user::UserRole,
    repository::{session_repo::SessionRepository, user_repo::UserRepository},
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 会话 Cookie 名称
pub const SESSION_COOKIE: &str = "sgea_session";

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn is_organizer(&self) -> bool {
        self.role == UserRole::Organizer
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 可选认证上下文：匿名请求得到 None 而不是 401
#[derive(Debug, Clone)]
pub struct MaybeAuthContext(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for MaybeAuthContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthContext(parts.extensions.get::<AuthContext>().cloned()))
    }
}

/// 从 Authorization 头提取 Bearer 令牌
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(|t| t.to_string()))
        .ok_or(AppError::Unauthorized)
}

/// 从 Cookie 头提取会话令牌，退化到 Bearer 形式
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookie_header) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
        for pair in cookie_header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    extract_bearer_token(headers).ok()
}

/// 会话认证中间件 - 必须认证
pub async fn session_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_session_token(req.headers()).ok_or(AppError::Unauthorized)?;
    let auth_context = resolve_session(&state, &token).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// 可选会话认证 - 匿名请求直接放行
pub async fn optional_session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(req.headers()) {
        if let Ok(auth_context) = resolve_session(&state, &token).await {
            req.extensions_mut().insert(auth_context);
        }
    }

    next.run(req).await
}

/// JWT 认证中间件（API 路由）
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(req.headers())?;

    let claims = jwt_service.validate_access_token(&token)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let auth_context = AuthContext {
        user_id,
        username: claims.username,
        role: UserRole::from(claims.role),
    };

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// 根据会话令牌解析认证上下文
async fn resolve_session(state: &AppState, token: &str) -> Result<AuthContext, AppError> {
    let session_repo = SessionRepository::new(state.db.clone());
    let token_hash = SessionRepository::hash_token(token);

    let session = session_repo
        .find_valid_by_hash(&token_hash)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let user = UserRepository::new(state.db.clone())
        .find_by_id(&session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthContext {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());

        let token = extract_bearer_token(&headers).unwrap();
        assert_eq!(token, "test_token_123");
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        let headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn test_extract_bearer_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());

        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            "theme=dark; sgea_session=abc123; lang=pt-BR".parse().unwrap(),
        );

        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_extract_session_token_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer xyz789".parse().unwrap());

        assert_eq!(extract_session_token(&headers), Some("xyz789".to_string()));
    }

    #[test]
    fn test_extract_session_token_absent() {
        let headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);
    }
}
