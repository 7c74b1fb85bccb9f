//! 路由注册
//! 创建所有 Web 与 API 路由并应用中间件

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

use crate::{auth, handlers, middleware::AppState};

/// 请求体大小上限（1 MiB；不处理文件上传）
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查、注册、登录、公开查询）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/", get(handlers::event::home))
        .route("/registro", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/confirmar-email/{token}", get(handlers::auth::confirm_email))
        .route("/eventos", get(handlers::event::list_events));

    // 可选认证端点：匿名可访问，认证后响应会附带访问者状态
    let optional_auth_routes = Router::new()
        .route("/eventos/{id}", get(handlers::event::get_event))
        .route("/certificados/validar", get(handlers::certificate::validate_certificate))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::optional_session_middleware,
        ));

    // 需要会话认证的 Web 端点
    let session_routes = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/dashboard", get(handlers::event::dashboard))

        // 事件管理
        .route("/eventos/novo", post(handlers::event::create_event))
        .route("/eventos/{id}/editar", post(handlers::event::edit_event))
        .route("/eventos/{id}/excluir", post(handlers::event::delete_event))
        .route("/eventos/{id}/inscritos", get(handlers::event::list_participants))

        // 报名
        .route(
            "/inscricoes/criar/{evento_id}",
            post(handlers::enrollment::create_enrollment),
        )
        .route(
            "/inscricoes/{id}/cancelar",
            post(handlers::enrollment::cancel_enrollment),
        )
        .route("/minhas-inscricoes", get(handlers::enrollment::my_enrollments))

        // 证书
        .route(
            "/certificados/emitir/{inscricao_id}",
            post(handlers::certificate::issue_certificate),
        )
        .route("/certificados", get(handlers::certificate::my_certificates))
        .route(
            "/certificados/{id}/download",
            get(handlers::certificate::download_certificate),
        )

        // 审计日志（仅组织者）
        .route("/auditoria", get(handlers::audit::list_audit_logs))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::session_auth_middleware,
        ));

    // API 令牌端点（无需认证）
    let api_public_routes =
        Router::new().route("/api/auth/login", post(handlers::api::api_login));

    // 需要 Bearer 令牌的 API 端点
    let api_routes = Router::new()
        .route("/api/eventos", get(handlers::api::list_events))
        .route("/api/eventos/{id}", get(handlers::api::get_event))
        .route(
            "/api/inscricoes",
            get(handlers::api::list_enrollments).post(handlers::api::create_enrollment),
        )
        .route("/api/inscricoes/{id}", delete(handlers::api::cancel_enrollment))
        .layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            auth::middleware::jwt_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(optional_auth_routes)
        .merge(session_routes)
        .merge(api_public_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
