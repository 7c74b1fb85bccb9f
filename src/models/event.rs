//! Event domain models

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Academic event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub kind: String, // seminar, lecture, short_course, academic_week
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: String,
    pub total_seats: i32,

    /// 创建后不可变更
    pub organizer_id: Uuid,
    pub professor_id: Option<Uuid>,
    pub banner_path: Option<String>,
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// 事件是否已结束（结束日期早于给定日期）
    pub fn has_ended(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }
}

/// Event kind enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Seminar,
    Lecture,
    ShortCourse,
    AcademicWeek,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Seminar => "seminar",
            EventKind::Lecture => "lecture",
            EventKind::ShortCourse => "short_course",
            EventKind::AcademicWeek => "academic_week",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EventKind::Seminar => "Seminar",
            EventKind::Lecture => "Lecture",
            EventKind::ShortCourse => "Short course",
            EventKind::AcademicWeek => "Academic week",
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "lecture" => EventKind::Lecture,
            "short_course" => EventKind::ShortCourse,
            "academic_week" => EventKind::AcademicWeek,
            _ => EventKind::Seminar,
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// 校验事件日程：结束日期不得早于开始日期；单日事件结束时间必须晚于开始时间
pub fn validate_schedule(
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<(), String> {
    if end_date < start_date {
        return Err("end_date: must not be before start_date".to_string());
    }

    if start_date == end_date && end_time <= start_time {
        return Err("end_time: must be after start_time on a single-day event".to_string());
    }

    Ok(())
}

/// Create event request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEventRequest {
    pub kind: EventKind,

    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "is required"))]
    pub description: String,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,

    #[validate(length(min = 1, max = 300, message = "must be between 1 and 300 characters"))]
    pub venue: String,

    #[validate(range(min = 1, message = "must be at least 1"))]
    pub total_seats: i32,

    pub professor_id: Option<Uuid>,
    pub banner_path: Option<String>,
}

/// Update event request (organizer is immutable and therefore absent)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    pub kind: Option<EventKind>,

    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "is required"))]
    pub description: Option<String>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,

    #[validate(length(min = 1, max = 300, message = "must be between 1 and 300 characters"))]
    pub venue: Option<String>,

    #[validate(range(min = 1, message = "must be at least 1"))]
    pub total_seats: Option<i32>,

    pub professor_id: Option<Uuid>,
    pub banner_path: Option<String>,
    pub active: Option<bool>,
}

/// Event listing filters
#[derive(Debug, Default, Deserialize)]
pub struct EventFilters {
    /// 按标题/描述模糊搜索
    pub search: Option<String>,
    #[serde(rename = "tipo")]
    pub kind: Option<EventKind>,
    /// open = 尚未开始, closed = 已开始
    pub status: Option<String>,
}

/// 事件行附带统计信息（列表查询的联表结果）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventWithStats {
    #[sqlx(flatten)]
    pub event: Event,
    pub organizer_name: String,
    pub active_enrollments: i64,
}

/// Event response
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub kind: EventKind,
    pub kind_display: &'static str,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: String,
    pub total_seats: i32,
    pub seats_available: i64,
    pub organizer_id: Uuid,
    pub organizer_name: String,
    pub professor_id: Option<Uuid>,
    pub banner_path: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<EventWithStats> for EventResponse {
    fn from(row: EventWithStats) -> Self {
        let kind = EventKind::from(row.event.kind.clone());
        let seats_available = (row.event.total_seats as i64 - row.active_enrollments).max(0);
        Self {
            id: row.event.id,
            kind,
            kind_display: kind.display_name(),
            title: row.event.title,
            description: row.event.description,
            start_date: row.event.start_date,
            end_date: row.event.end_date,
            start_time: row.event.start_time,
            end_time: row.event.end_time,
            venue: row.event.venue,
            total_seats: row.event.total_seats,
            seats_available,
            organizer_id: row.event.organizer_id,
            organizer_name: row.organizer_name,
            professor_id: row.event.professor_id,
            banner_path: row.event.banner_path,
            active: row.event.active,
            created_at: row.event.created_at,
        }
    }
}

/// Event detail, enriched for an authenticated viewer
#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub viewer_enrolled: bool,
    pub viewer_enrollment_id: Option<Uuid>,
    pub viewer_has_certificate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_schedule_end_before_start_rejected() {
        let result = validate_schedule(date(2026, 9, 10), date(2026, 9, 9), time(9, 0), time(17, 0));
        assert!(result.is_err());
    }

    #[test]
    fn test_schedule_single_day_time_ordering() {
        // 同一天结束时间必须晚于开始时间
        assert!(validate_schedule(date(2026, 9, 10), date(2026, 9, 10), time(9, 0), time(9, 0)).is_err());
        assert!(validate_schedule(date(2026, 9, 10), date(2026, 9, 10), time(17, 0), time(9, 0)).is_err());
        assert!(validate_schedule(date(2026, 9, 10), date(2026, 9, 10), time(9, 0), time(17, 0)).is_ok());
    }

    #[test]
    fn test_schedule_multi_day_ignores_time_ordering() {
        // 跨天事件允许结束时间早于开始时间（如晚场到早场）
        assert!(validate_schedule(date(2026, 9, 10), date(2026, 9, 12), time(19, 0), time(12, 0)).is_ok());
    }

    #[test]
    fn test_event_has_ended() {
        let event = Event {
            id: Uuid::new_v4(),
            kind: "seminar".to_string(),
            title: "Rust for research software".to_string(),
            description: "Intro".to_string(),
            start_date: date(2026, 3, 1),
            end_date: date(2026, 3, 2),
            start_time: time(9, 0),
            end_time: time(17, 0),
            venue: "Main auditorium".to_string(),
            total_seats: 30,
            organizer_id: Uuid::new_v4(),
            professor_id: None,
            banner_path: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(event.has_ended(date(2026, 3, 3)));
        assert!(!event.has_ended(date(2026, 3, 2)));
        assert!(!event.has_ended(date(2026, 2, 28)));
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            EventKind::Seminar,
            EventKind::Lecture,
            EventKind::ShortCourse,
            EventKind::AcademicWeek,
        ] {
            let s: String = kind.into();
            assert_eq!(EventKind::from(s), kind);
        }
    }

    #[test]
    fn test_create_event_request_validation() {
        let req = CreateEventRequest {
            kind: EventKind::Seminar,
            title: "Research methods".to_string(),
            description: "A seminar".to_string(),
            start_date: date(2026, 9, 10),
            end_date: date(2026, 9, 10),
            start_time: time(9, 0),
            end_time: time(12, 0),
            venue: "Room 101".to_string(),
            total_seats: 50,
            professor_id: None,
            banner_path: None,
        };
        assert!(validator::Validate::validate(&req).is_ok());

        let zero_seats = CreateEventRequest {
            total_seats: 0,
            ..req
        };
        assert!(validator::Validate::validate(&zero_seats).is_err());
    }
}
