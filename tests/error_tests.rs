//! 错误处理单元测试
//!
//! 测试应用错误类型的各种行为

use axum::http::StatusCode;
use sgea_system::error::{AppError, ErrorDetail, ErrorResponse};

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::NotFound("event".to_string()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        AppError::BadRequest("invalid".to_string()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::Validation("error".to_string()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn test_server_error_status_codes() {
    let db_error = AppError::Database(sqlx::Error::RowNotFound);
    assert_eq!(db_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let config_error = AppError::Config("Invalid config".to_string());
    assert_eq!(config_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let internal_error = AppError::Internal("Something went wrong".to_string());
    assert_eq!(internal_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ==================== 用户消息测试 ====================

#[test]
fn test_user_messages_no_sensitive_info() {
    // 数据库错误不应该暴露技术细节
    let db_error = AppError::Database(sqlx::Error::RowNotFound);
    let message = db_error.user_message();
    assert_eq!(message, "Database error occurred");
    assert!(!message.to_lowercase().contains("sqlx"));
    assert!(!message.to_lowercase().contains("row"));

    // 配置错误
    let config_error = AppError::Config("Missing database URL".to_string());
    let message = config_error.user_message();
    assert_eq!(message, "Configuration error");
    assert!(!message.contains("URL"));

    // 内部错误
    let internal = AppError::Internal("argon2 failure".to_string());
    assert_eq!(internal.user_message(), "Internal server error");
}

#[test]
fn test_user_messages_for_client_errors() {
    assert_eq!(AppError::Unauthorized.user_message(), "Authentication failed");
    assert_eq!(AppError::Forbidden.user_message(), "Access denied");
    assert_eq!(
        AppError::NotFound("event".to_string()).user_message(),
        "Resource not found: event"
    );
    assert_eq!(
        AppError::BadRequest("Invalid input".to_string()).user_message(),
        "Invalid input"
    );
    assert_eq!(
        AppError::Validation("event: has no seats available".to_string()).user_message(),
        "event: has no seats available"
    );
    assert_eq!(AppError::RateLimitExceeded.user_message(), "Rate limit exceeded");
}

// ==================== 错误码测试 ====================

#[test]
fn test_error_codes() {
    assert_eq!(AppError::Unauthorized.code(), 401);
    assert_eq!(AppError::Forbidden.code(), 403);
    assert_eq!(AppError::NotFound("test".to_string()).code(), 404);
    assert_eq!(AppError::BadRequest("test".to_string()).code(), 400);
    assert_eq!(AppError::Validation("test".to_string()).code(), 400);
    assert_eq!(AppError::RateLimitExceeded.code(), 429);
    assert_eq!(AppError::Internal("test".to_string()).code(), 500);
}

#[test]
fn test_error_code_consistency() {
    let errors = vec![
        AppError::Unauthorized,
        AppError::Forbidden,
        AppError::NotFound("test".to_string()),
        AppError::BadRequest("test".to_string()),
        AppError::Validation("test".to_string()),
        AppError::RateLimitExceeded,
        AppError::Internal("test".to_string()),
    ];

    for error in errors {
        assert_eq!(error.code(), error.status_code().as_u16());
    }
}

// ==================== 便捷方法测试 ====================

#[test]
fn test_convenience_methods() {
    let err = AppError::not_found("enrollment");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = AppError::validation("event: has already taken place");
    assert!(matches!(err, AppError::Validation(_)));

    let err = AppError::bad_request("Account temporarily locked");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = AppError::internal("hash failure");
    assert!(matches!(err, AppError::Internal(_)));
}

// ==================== 错误显示测试 ====================

#[test]
fn test_error_display() {
    assert_eq!(format!("{}", AppError::Unauthorized), "Authentication failed");
    assert_eq!(format!("{}", AppError::Forbidden), "Access denied");
    assert_eq!(
        format!("{}", AppError::NotFound("event".to_string())),
        "Resource not found: event"
    );
    assert_eq!(
        format!("{}", AppError::Validation("username: is already taken".to_string())),
        "Validation failed: username: is already taken"
    );
}

// ==================== From 转换测试 ====================

#[test]
fn test_from_string() {
    let app_error = AppError::from("Config error".to_string());
    assert!(matches!(app_error, AppError::Config(_)));
}

#[test]
fn test_from_sqlx_error() {
    let app_error = AppError::from(sqlx::Error::RowNotFound);
    assert!(matches!(app_error, AppError::Database(_)));
}

// ==================== 错误序列化测试 ====================

#[test]
fn test_error_response_serialization() {
    let error_response = ErrorResponse {
        error: ErrorDetail {
            code: 404,
            message: "Resource not found: event".to_string(),
            request_id: "req-123".to_string(),
        },
    };

    let json = serde_json::to_string(&error_response).unwrap();
    let json_obj: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(json_obj["error"]["code"], 404);
    assert_eq!(json_obj["error"]["message"], "Resource not found: event");
    assert_eq!(json_obj["error"]["request_id"], "req-123");
}

// ==================== 错误传播测试 ====================

#[test]
fn test_error_with_question_mark_operator() {
    fn inner() -> Result<(), AppError> {
        Err(AppError::validation("event: has no seats available"))
    }

    fn outer() -> Result<(), AppError> {
        inner()?;
        Ok(())
    }

    let result = outer();
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().status_code(), StatusCode::BAD_REQUEST);
}
