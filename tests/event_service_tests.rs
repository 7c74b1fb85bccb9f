//! 事件服务集成测试
//! 角色限制、日程校验与组织者所有权
//!
//! 这些用例需要 TEST_DATABASE_URL 指向的 PostgreSQL 实例。

use chrono::Duration;
use sgea_system::{
    error::AppError,
    models::{
        event::{CreateEventRequest, EventKind, UpdateEventRequest},
        user::UserRole,
    },
};

mod common;
use common::{auth_context, create_test_event, create_test_user, upcoming_dates, TestServices};

fn create_request(title: &str) -> CreateEventRequest {
    let (start, end) = upcoming_dates();
    CreateEventRequest {
        kind: EventKind::Seminar,
        title: title.to_string(),
        description: "A seminar about research software".to_string(),
        start_date: start,
        end_date: end,
        start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        venue: "Main auditorium".to_string(),
        total_seats: 30,
        professor_id: None,
        banner_path: None,
    }
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_only_organizers_create_events() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let services = TestServices::new(pool.clone(), &config);

    let organizer_id = create_test_user(&pool, "organizer1", "TestPass123!", UserRole::Organizer).await;
    let student_id = create_test_user(&pool, "student_a", "TestPass123!", UserRole::Student).await;

    let organizer_ctx = auth_context(organizer_id, "organizer1", UserRole::Organizer);
    let student_ctx = auth_context(student_id, "student_a", UserRole::Student);

    let event = services
        .events
        .create(&organizer_ctx, create_request("Seminar"), "127.0.0.1")
        .await
        .expect("organizer should create events");
    assert_eq!(event.organizer_id, organizer_id);
    assert_eq!(event.seats_available, 30);

    let err = services
        .events
        .create(&student_ctx, create_request("Student event"), "127.0.0.1")
        .await
        .expect_err("students must not create events");
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_schedule_validation_on_create() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let services = TestServices::new(pool.clone(), &config);

    let organizer_id = create_test_user(&pool, "organizer1", "TestPass123!", UserRole::Organizer).await;
    let ctx = auth_context(organizer_id, "organizer1", UserRole::Organizer);

    // 结束日期早于开始日期
    let mut req = create_request("Broken dates");
    req.end_date = req.start_date - Duration::days(1);
    let err = services
        .events
        .create(&ctx, req, "127.0.0.1")
        .await
        .expect_err("end date before start date must fail");
    assert!(matches!(err, AppError::Validation(_)));

    // 单日事件结束时间不晚于开始时间
    let mut req = create_request("Broken times");
    req.end_date = req.start_date;
    req.end_time = req.start_time;
    let err = services
        .events
        .create(&ctx, req, "127.0.0.1")
        .await
        .expect_err("single-day event with non-positive duration must fail");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_only_owner_edits_and_deletes() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let services = TestServices::new(pool.clone(), &config);

    let owner_id = create_test_user(&pool, "organizer1", "TestPass123!", UserRole::Organizer).await;
    let other_id = create_test_user(&pool, "organizer2", "TestPass123!", UserRole::Organizer).await;

    let (start, end) = upcoming_dates();
    let event_id = create_test_event(&pool, owner_id, "Seminar", 10, start, end).await;

    let owner_ctx = auth_context(owner_id, "organizer1", UserRole::Organizer);
    let other_ctx = auth_context(other_id, "organizer2", UserRole::Organizer);

    let update = UpdateEventRequest {
        title: Some("Renamed seminar".to_string()),
        ..Default::default()
    };

    let err = services
        .events
        .update(&other_ctx, event_id, update.clone(), "127.0.0.1")
        .await
        .expect_err("non-owners must not edit the event");
    assert!(matches!(err, AppError::Forbidden));

    let updated = services
        .events
        .update(&owner_ctx, event_id, update, "127.0.0.1")
        .await
        .expect("owner should edit the event");
    assert_eq!(updated.title, "Renamed seminar");

    let err = services
        .events
        .delete(&other_ctx, event_id, "127.0.0.1")
        .await
        .expect_err("non-owners must not delete the event");
    assert!(matches!(err, AppError::Forbidden));

    services
        .events
        .delete(&owner_ctx, event_id, "127.0.0.1")
        .await
        .expect("owner should delete the event");
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_seats_cannot_drop_below_active_enrollments() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let services = TestServices::new(pool.clone(), &config);

    let organizer_id = create_test_user(&pool, "organizer1", "TestPass123!", UserRole::Organizer).await;
    let user_a = create_test_user(&pool, "student_a", "TestPass123!", UserRole::Student).await;
    let user_b = create_test_user(&pool, "student_b", "TestPass123!", UserRole::Student).await;

    let (start, end) = upcoming_dates();
    let event_id = create_test_event(&pool, organizer_id, "Seminar", 10, start, end).await;

    for (id, name) in [(user_a, "student_a"), (user_b, "student_b")] {
        let ctx = auth_context(id, name, UserRole::Student);
        services
            .enrollments
            .enroll(&ctx, event_id, "127.0.0.1", false)
            .await
            .unwrap();
    }

    let organizer_ctx = auth_context(organizer_id, "organizer1", UserRole::Organizer);

    let err = services
        .events
        .update(
            &organizer_ctx,
            event_id,
            UpdateEventRequest {
                total_seats: Some(1),
                ..Default::default()
            },
            "127.0.0.1",
        )
        .await
        .expect_err("seats below active enrollments must fail");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
#[ignore] // 需要数据库
async fn test_participant_list_restricted_to_owner() {
    let config = common::create_test_config();
    let pool = common::setup_test_db(&config).await;
    let services = TestServices::new(pool.clone(), &config);

    let owner_id = create_test_user(&pool, "organizer1", "TestPass123!", UserRole::Organizer).await;
    let other_id = create_test_user(&pool, "organizer2", "TestPass123!", UserRole::Organizer).await;
    let student_id = create_test_user(&pool, "student_a", "TestPass123!", UserRole::Student).await;

    let (start, end) = upcoming_dates();
    let event_id = create_test_event(&pool, owner_id, "Seminar", 10, start, end).await;

    let student_ctx = auth_context(student_id, "student_a", UserRole::Student);
    services
        .enrollments
        .enroll(&student_ctx, event_id, "127.0.0.1", false)
        .await
        .unwrap();

    let owner_ctx = auth_context(owner_id, "organizer1", UserRole::Organizer);
    let participants = services
        .events
        .participants(&owner_ctx, event_id)
        .await
        .expect("owner should list participants");
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].username, "student_a");
    assert!(!participants[0].certificate_issued);

    let other_ctx = auth_context(other_id, "organizer2", UserRole::Organizer);
    let err = services
        .events
        .participants(&other_ctx, event_id)
        .await
        .expect_err("non-owners must not list participants");
    assert!(matches!(err, AppError::Forbidden));
}
