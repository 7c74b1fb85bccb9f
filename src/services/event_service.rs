//! 事件服务：创建、编辑、删除、列表、详情与仪表盘

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    models::{
        enrollment::{EnrollmentResponse, ParticipantResponse},
        event::{
            validate_schedule, CreateEventRequest, EventDetailResponse, EventFilters,
            EventResponse, UpdateEventRequest,
        },
        user::UserRole,
    },
    repository::{
        certificate_repo::CertificateRepository, enrollment_repo::EnrollmentRepository,
        event_repo::EventRepository, user_repo::UserRepository,
    },
    services::{audit_service::AuditAction, AuditService},
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 组织者仪表盘
#[derive(Debug, Serialize)]
pub struct OrganizerDashboard {
    pub events: Vec<EventResponse>,
    pub total_events: usize,
    pub total_active_enrollments: i64,
    pub certificates_issued: i64,
}

/// 参与者仪表盘
#[derive(Debug, Serialize)]
pub struct ParticipantDashboard {
    pub active_enrollments: Vec<EnrollmentResponse>,
    pub total_active_enrollments: usize,
    pub certificates: usize,
}

/// 仪表盘响应（按角色二选一）
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum DashboardResponse {
    Organizer(OrganizerDashboard),
    Participant(ParticipantDashboard),
}

/// 首页响应：近期事件与总量统计
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub upcoming_events: Vec<EventResponse>,
    pub total_events: i64,
    pub total_users: i64,
}

pub struct EventService {
    db: PgPool,
    audit: Arc<AuditService>,
}

impl EventService {
    pub fn new(db: PgPool, audit: Arc<AuditService>) -> Self {
        Self { db, audit }
    }

    /// 创建事件（仅组织者）
    pub async fn create(
        &self,
        ctx: &AuthContext,
        req: CreateEventRequest,
        client_ip: &str,
    ) -> Result<EventResponse, AppError> {
        if !ctx.is_organizer() {
            return Err(AppError::Forbidden);
        }

        req.validate()?;
        validate_schedule(req.start_date, req.end_date, req.start_time, req.end_time)
            .map_err(AppError::Validation)?;

        self.check_professor(req.professor_id).await?;

        let event_repo = EventRepository::new(self.db.clone());
        let event = event_repo.create(ctx.user_id, &req).await?;

        tracing::info!(
            event_id = %event.id,
            organizer_id = %ctx.user_id,
            title = %event.title,
            "Event created"
        );

        if let Err(err) = self
            .audit
            .record(
                Some((ctx.user_id, &ctx.username)),
                AuditAction::EventCreate,
                format!("Event created: {}", event.title),
                Some(client_ip),
                Some(serde_json::json!({
                    "event_id": event.id,
                    "kind": event.kind,
                    "start_date": event.start_date,
                })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write event creation audit record");
        }

        let row = event_repo
            .find_with_stats(&event.id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        Ok(EventResponse::from(row))
    }

    /// 编辑事件（仅所属组织者；组织者字段不可变更）
    pub async fn update(
        &self,
        ctx: &AuthContext,
        event_id: Uuid,
        req: UpdateEventRequest,
        client_ip: &str,
    ) -> Result<EventResponse, AppError> {
        let event_repo = EventRepository::new(self.db.clone());

        let event = event_repo
            .find_by_id(&event_id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        if event.organizer_id != ctx.user_id {
            return Err(AppError::Forbidden);
        }

        req.validate()?;

        // 合并后的日程必须依旧有效
        validate_schedule(
            req.start_date.unwrap_or(event.start_date),
            req.end_date.unwrap_or(event.end_date),
            req.start_time.unwrap_or(event.start_time),
            req.end_time.unwrap_or(event.end_time),
        )
        .map_err(AppError::Validation)?;

        // 容量不得低于当前有效报名数
        if let Some(total_seats) = req.total_seats {
            let taken = EnrollmentRepository::new(self.db.clone())
                .count_active_for_event(event_id)
                .await?;
            if (total_seats as i64) < taken {
                return Err(AppError::validation(
                    "total_seats: cannot be lower than the current number of active enrollments",
                ));
            }
        }

        self.check_professor(req.professor_id).await?;

        let updated = event_repo
            .update(event_id, &req)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        if let Err(err) = self
            .audit
            .record(
                Some((ctx.user_id, &ctx.username)),
                AuditAction::EventUpdate,
                format!("Event updated: {}", updated.title),
                Some(client_ip),
                Some(serde_json::json!({ "event_id": updated.id })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write event update audit record");
        }

        let row = event_repo
            .find_with_stats(&updated.id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        Ok(EventResponse::from(row))
    }

    /// 删除事件（仅所属组织者；报名级联删除）
    pub async fn delete(
        &self,
        ctx: &AuthContext,
        event_id: Uuid,
        client_ip: &str,
    ) -> Result<(), AppError> {
        let event_repo = EventRepository::new(self.db.clone());

        let event = event_repo
            .find_by_id(&event_id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        if event.organizer_id != ctx.user_id {
            return Err(AppError::Forbidden);
        }

        event_repo.delete(event_id).await?;

        tracing::info!(event_id = %event_id, title = %event.title, "Event deleted");

        if let Err(err) = self
            .audit
            .record(
                Some((ctx.user_id, &ctx.username)),
                AuditAction::EventDelete,
                format!("Event deleted: {}", event.title),
                Some(client_ip),
                Some(serde_json::json!({ "event_id": event.id, "kind": event.kind })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write event deletion audit record");
        }

        Ok(())
    }

    /// 公开事件列表
    pub async fn list(
        &self,
        filters: &EventFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventResponse>, AppError> {
        let today = chrono::Utc::now().date_naive();
        let rows = EventRepository::new(self.db.clone())
            .list(filters, today, limit, offset)
            .await?;

        Ok(rows.into_iter().map(EventResponse::from).collect())
    }

    /// API 事件列表：仅有效且尚未开始的事件
    pub async fn list_upcoming(&self, limit: i64, offset: i64) -> Result<Vec<EventResponse>, AppError> {
        let today = chrono::Utc::now().date_naive();
        let rows = EventRepository::new(self.db.clone())
            .list_upcoming(today, limit, offset)
            .await?;

        Ok(rows.into_iter().map(EventResponse::from).collect())
    }

    /// API 事件详情：仅有效且尚未开始的事件
    pub async fn detail_upcoming(&self, event_id: Uuid) -> Result<EventResponse, AppError> {
        let today = chrono::Utc::now().date_naive();
        let row = EventRepository::new(self.db.clone())
            .find_with_stats(&event_id)
            .await?
            .filter(|row| row.event.active && row.event.start_date >= today)
            .ok_or_else(|| AppError::not_found("event"))?;

        Ok(EventResponse::from(row))
    }

    /// 首页：近期事件与总量统计
    pub async fn home(&self) -> Result<HomeResponse, AppError> {
        let today = chrono::Utc::now().date_naive();
        let event_repo = EventRepository::new(self.db.clone());

        let upcoming = event_repo.list_upcoming(today, 6, 0).await?;
        let total_events = event_repo.count_active().await?;
        let total_users = UserRepository::new(self.db.clone()).count().await?;

        Ok(HomeResponse {
            upcoming_events: upcoming.into_iter().map(EventResponse::from).collect(),
            total_events,
            total_users,
        })
    }

    /// 事件详情；已认证访问者附带报名与证书状态
    pub async fn detail(
        &self,
        event_id: Uuid,
        viewer: Option<&AuthContext>,
    ) -> Result<EventDetailResponse, AppError> {
        let row = EventRepository::new(self.db.clone())
            .find_with_stats(&event_id)
            .await?
            .filter(|row| row.event.active)
            .ok_or_else(|| AppError::not_found("event"))?;

        let mut viewer_enrolled = false;
        let mut viewer_enrollment_id = None;
        let mut viewer_has_certificate = false;

        if let Some(ctx) = viewer {
            let enrollment = EnrollmentRepository::new(self.db.clone())
                .find_active(ctx.user_id, event_id)
                .await?;

            if let Some(enrollment) = enrollment {
                viewer_enrolled = true;
                viewer_enrollment_id = Some(enrollment.id);
                viewer_has_certificate = CertificateRepository::new(self.db.clone())
                    .find_by_enrollment(enrollment.id)
                    .await?
                    .is_some();
            }
        }

        Ok(EventDetailResponse {
            event: EventResponse::from(row),
            viewer_enrolled,
            viewer_enrollment_id,
            viewer_has_certificate,
        })
    }

    /// 某事件的报名名单（仅所属组织者）
    pub async fn participants(
        &self,
        ctx: &AuthContext,
        event_id: Uuid,
    ) -> Result<Vec<ParticipantResponse>, AppError> {
        let event = EventRepository::new(self.db.clone())
            .find_by_id(&event_id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        if event.organizer_id != ctx.user_id {
            return Err(AppError::Forbidden);
        }

        let rows = EnrollmentRepository::new(self.db.clone())
            .list_active_by_event(event_id)
            .await?;

        Ok(rows.into_iter().map(ParticipantResponse::from).collect())
    }

    /// 仪表盘：组织者看自己的事件，其他角色看自己的报名
    pub async fn dashboard(&self, ctx: &AuthContext) -> Result<DashboardResponse, AppError> {
        match ctx.role {
            UserRole::Organizer => {
                let events = EventRepository::new(self.db.clone())
                    .list_by_organizer(ctx.user_id)
                    .await?;
                let total_active_enrollments = EnrollmentRepository::new(self.db.clone())
                    .count_active_for_organizer(ctx.user_id)
                    .await?;
                let certificates_issued = CertificateRepository::new(self.db.clone())
                    .count_by_issuer(ctx.user_id)
                    .await?;

                let events: Vec<EventResponse> =
                    events.into_iter().map(EventResponse::from).collect();

                Ok(DashboardResponse::Organizer(OrganizerDashboard {
                    total_events: events.len(),
                    events,
                    total_active_enrollments,
                    certificates_issued,
                }))
            }
            _ => {
                let enrollments = EnrollmentRepository::new(self.db.clone())
                    .list_active_by_user(ctx.user_id)
                    .await?;
                let certificates = CertificateRepository::new(self.db.clone())
                    .list_by_user(ctx.user_id)
                    .await?;

                let active_enrollments: Vec<EnrollmentResponse> =
                    enrollments.into_iter().map(EnrollmentResponse::from).collect();

                Ok(DashboardResponse::Participant(ParticipantDashboard {
                    total_active_enrollments: active_enrollments.len(),
                    active_enrollments,
                    certificates: certificates.len(),
                }))
            }
        }
    }

    /// 责任教师必须是教师角色
    async fn check_professor(&self, professor_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(professor_id) = professor_id {
            let professor = UserRepository::new(self.db.clone())
                .find_by_id(&professor_id)
                .await?
                .ok_or_else(|| AppError::validation("professor_id: unknown user"))?;

            if professor.role() != UserRole::Professor {
                return Err(AppError::validation("professor_id: must reference a professor"));
            }
        }

        Ok(())
    }
}
