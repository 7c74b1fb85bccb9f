//! 路由级集成测试
//! 通过 tower 的 oneshot 驱动完整的中间件与处理器链
//!
//! 这些用例需要 TEST_DATABASE_URL 指向的 PostgreSQL 实例。

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sgea_system::{models::user::UserRole, routes};
use tower::util::ServiceExt;

mod common;
use common::{create_test_user, TestServices};

async fn test_router() -> (Router, sqlx::PgPool, sgea_system::config::AppConfig) {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let state = common::create_test_app_state(pool.clone(), &config).await;

    (routes::create_router(state), pool, config)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_health_endpoint() {
    let (app, _pool, _config) = test_router().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_api_requires_bearer_token() {
    let (app, _pool, _config) = test_router().await;

    let response = app
        .oneshot(Request::builder().uri("/api/eventos").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_api_event_listing_hits_daily_quota() {
    let (app, pool, config) = test_router().await;
    let services = TestServices::new(pool.clone(), &config);

    create_test_user(&pool, "maria", "Sup3rSecret!", UserRole::Student).await;
    let token = services
        .auth
        .issue_api_token(
            sgea_system::models::auth::ApiTokenRequest {
                username: "maria".to_string(),
                password: "Sup3rSecret!".to_string(),
            },
            "127.0.0.1",
        )
        .await
        .unwrap()
        .access_token;

    // 测试配置的事件查询配额为 3：前 3 次通过，第 4 次 429
    for expected in [StatusCode::OK, StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/eventos")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_web_registration_and_login_flow() {
    let (app, _pool, _config) = test_router().await;

    // 注册
    let register = json!({
        "username": "maria",
        "email": "maria@example.edu",
        "password": "Sup3rSecret!",
        "first_name": "Maria",
        "last_name": "Silva",
        "phone": "(11) 98765-4321",
        "institution": "UFRJ",
        "role": "student"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/registro")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(register.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // 登录拿到会话 Cookie
    let login = json!({ "username": "maria", "password": "Sup3rSecret!" });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(login.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(';').next().unwrap().to_string())
        .expect("login must set the session cookie");

    // 会话 Cookie 可访问受保护端点
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/minhas-inscricoes")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 无会话被拒绝
    let response = app
        .oneshot(Request::builder().uri("/minhas-inscricoes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_registration_validation_error_shape() {
    let (app, _pool, _config) = test_router().await;

    // 弱密码：结构化 400 响应
    let register = json!({
        "username": "maria",
        "email": "maria@example.edu",
        "password": "weak",
        "first_name": "Maria",
        "last_name": "Silva",
        "phone": "(11) 98765-4321",
        "institution": "UFRJ",
        "role": "student"
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/registro")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(register.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 400);
    assert!(body["error"]["message"].as_str().unwrap().contains("password"));
    assert!(body["error"]["request_id"].is_string());
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_certificate_validation_endpoint_is_public() {
    let (app, _pool, _config) = test_router().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/certificados/validar?codigo=SGEA-UNKNOWN123456789AB")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], false);

    // 缺少验证码参数
    let response = app
        .oneshot(
            Request::builder()
                .uri("/certificados/validar")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
