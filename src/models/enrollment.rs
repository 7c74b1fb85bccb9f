//! Enrollment domain models

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enrollment of a user in an event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub active: bool,
    pub enrolled_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// 报名行附带事件摘要（“我的报名”列表）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrollmentWithEvent {
    pub id: Uuid,
    pub event_id: Uuid,
    pub active: bool,
    pub enrolled_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub event_title: String,
    pub event_kind: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub venue: String,
}

/// 报名行附带参与者信息（组织者的报名名单）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnrollmentWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub active: bool,
    pub enrolled_at: DateTime<Utc>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub institution: Option<String>,
    pub certificate_id: Option<Uuid>,
}

/// Enrollment response
#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_kind: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub venue: String,
    pub active: bool,
    pub enrolled_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<EnrollmentWithEvent> for EnrollmentResponse {
    fn from(row: EnrollmentWithEvent) -> Self {
        Self {
            id: row.id,
            event_id: row.event_id,
            event_title: row.event_title,
            event_kind: row.event_kind,
            start_date: row.start_date,
            end_date: row.end_date,
            start_time: row.start_time,
            venue: row.venue,
            active: row.active,
            enrolled_at: row.enrolled_at,
            cancelled_at: row.cancelled_at,
        }
    }
}

/// Participant entry on an organizer's enrollment list
#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    pub enrollment_id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub institution: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    pub certificate_issued: bool,
}

impl From<EnrollmentWithUser> for ParticipantResponse {
    fn from(row: EnrollmentWithUser) -> Self {
        Self {
            enrollment_id: row.id,
            user_id: row.user_id,
            full_name: format!("{} {}", row.first_name, row.last_name),
            username: row.username,
            email: row.email,
            institution: row.institution,
            enrolled_at: row.enrolled_at,
            certificate_issued: row.certificate_id.is_some(),
        }
    }
}

/// API enrollment creation request
#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub event_id: Uuid,
}
