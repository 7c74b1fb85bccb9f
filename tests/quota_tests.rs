//! API 每日配额集成测试
//!
//! 这些用例需要 TEST_DATABASE_URL 指向的 PostgreSQL 实例。

use sgea_system::{error::AppError, models::user::UserRole, services::QuotaScope};

mod common;
use common::{create_test_user, TestServices};

#[tokio::test]
#[ignore] // 需要数据库
async fn test_quota_exceeded_returns_rate_limit_error() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let services = TestServices::new(pool.clone(), &config);

    let user_id = create_test_user(&pool, "student_a", "TestPass123!", UserRole::Student).await;

    // 测试配置的事件查询配额为 3
    for _ in 0..3 {
        services
            .quota
            .check_and_count(user_id, QuotaScope::EventQuery)
            .await
            .expect("requests within the quota should pass");
    }

    let err = services
        .quota
        .check_and_count(user_id, QuotaScope::EventQuery)
        .await
        .expect_err("request over the quota must fail");
    assert!(matches!(err, AppError::RateLimitExceeded));
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_quota_is_per_user_and_per_scope() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let services = TestServices::new(pool.clone(), &config);

    let user_a = create_test_user(&pool, "student_a", "TestPass123!", UserRole::Student).await;
    let user_b = create_test_user(&pool, "student_b", "TestPass123!", UserRole::Student).await;

    // 用尽 A 的事件查询配额
    for _ in 0..3 {
        services
            .quota
            .check_and_count(user_a, QuotaScope::EventQuery)
            .await
            .unwrap();
    }
    assert!(services
        .quota
        .check_and_count(user_a, QuotaScope::EventQuery)
        .await
        .is_err());

    // 其他范围不受影响
    services
        .quota
        .check_and_count(user_a, QuotaScope::EnrollmentCreate)
        .await
        .expect("a different scope has its own counter");

    // 其他用户不受影响
    services
        .quota
        .check_and_count(user_b, QuotaScope::EventQuery)
        .await
        .expect("another user has their own counter");
}
