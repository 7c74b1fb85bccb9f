//! 报名服务：报名创建（容量控制）与取消

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    models::enrollment::{Enrollment, EnrollmentResponse},
    repository::{
        enrollment_repo::EnrollmentRepository, event_repo::EventRepository,
        user_repo::UserRepository,
    },
    services::{audit_service::AuditAction, AuditService, NotificationService},
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct EnrollmentService {
    db: PgPool,
    audit: Arc<AuditService>,
    notifier: Arc<NotificationService>,
}

impl EnrollmentService {
    pub fn new(db: PgPool, audit: Arc<AuditService>, notifier: Arc<NotificationService>) -> Self {
        Self {
            db,
            audit,
            notifier,
        }
    }

    /// 报名：资格检查后在事务内完成容量检查与插入
    pub async fn enroll(
        &self,
        ctx: &AuthContext,
        event_id: Uuid,
        client_ip: &str,
        via_api: bool,
    ) -> Result<Enrollment, AppError> {
        // 组织者不参加事件
        if ctx.is_organizer() {
            return Err(AppError::validation("role: organizers cannot enroll in events"));
        }

        let today = chrono::Utc::now().date_naive();
        let enrollment = EnrollmentRepository::new(self.db.clone())
            .enroll_within_capacity(ctx.user_id, event_id, today)
            .await?;

        let event = EventRepository::new(self.db.clone())
            .find_by_id(&event_id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        tracing::info!(
            enrollment_id = %enrollment.id,
            user_id = %ctx.user_id,
            event_id = %event_id,
            "Enrollment created"
        );

        let action = if via_api {
            AuditAction::ApiEnrollmentCreate
        } else {
            AuditAction::EnrollmentCreate
        };

        if let Err(err) = self
            .audit
            .record(
                Some((ctx.user_id, &ctx.username)),
                action,
                format!("Enrolled in event: {}", event.title),
                Some(client_ip),
                Some(serde_json::json!({
                    "event_id": event.id,
                    "enrollment_id": enrollment.id,
                })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write enrollment audit record");
        }

        // 报名确认通知需要收件人邮箱
        if let Some(user) = UserRepository::new(self.db.clone()).find_by_id(&ctx.user_id).await? {
            self.notifier.send_enrollment_confirmation(
                &user.email,
                &user.full_name(),
                &event.title,
                event.start_date,
            );
        }

        Ok(enrollment)
    }

    /// 取消报名：仅限本人的有效报名
    pub async fn cancel(
        &self,
        ctx: &AuthContext,
        enrollment_id: Uuid,
        client_ip: &str,
    ) -> Result<Enrollment, AppError> {
        let enrollment = EnrollmentRepository::new(self.db.clone())
            .cancel(enrollment_id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("active enrollment"))?;

        self.record_cancellation(ctx, &enrollment, AuditAction::EnrollmentCancel, client_ip)
            .await;

        Ok(enrollment)
    }

    /// API 取消：事件已结束的报名不可取消
    pub async fn api_cancel(
        &self,
        ctx: &AuthContext,
        enrollment_id: Uuid,
        client_ip: &str,
    ) -> Result<(), AppError> {
        let repo = EnrollmentRepository::new(self.db.clone());

        let enrollment = repo
            .find_by_id(&enrollment_id)
            .await?
            .filter(|e| e.user_id == ctx.user_id && e.active)
            .ok_or_else(|| AppError::not_found("active enrollment"))?;

        let event = EventRepository::new(self.db.clone())
            .find_by_id(&enrollment.event_id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        let today = chrono::Utc::now().date_naive();
        if event.has_ended(today) {
            return Err(AppError::bad_request(
                "Cannot cancel an enrollment for an event that has already taken place",
            ));
        }

        let enrollment = repo
            .cancel(enrollment_id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("active enrollment"))?;

        self.record_cancellation(ctx, &enrollment, AuditAction::ApiEnrollmentCancel, client_ip)
            .await;

        Ok(())
    }

    /// 我的全部报名（含已取消）
    pub async fn my_enrollments(&self, ctx: &AuthContext) -> Result<Vec<EnrollmentResponse>, AppError> {
        let rows = EnrollmentRepository::new(self.db.clone())
            .list_by_user(ctx.user_id)
            .await?;

        Ok(rows.into_iter().map(EnrollmentResponse::from).collect())
    }

    /// 我的有效报名（API 列表）
    pub async fn my_active_enrollments(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<EnrollmentResponse>, AppError> {
        let rows = EnrollmentRepository::new(self.db.clone())
            .list_active_by_user(ctx.user_id)
            .await?;

        Ok(rows.into_iter().map(EnrollmentResponse::from).collect())
    }

    async fn record_cancellation(
        &self,
        ctx: &AuthContext,
        enrollment: &Enrollment,
        action: AuditAction,
        client_ip: &str,
    ) {
        tracing::info!(
            enrollment_id = %enrollment.id,
            user_id = %ctx.user_id,
            event_id = %enrollment.event_id,
            "Enrollment cancelled"
        );

        if let Err(err) = self
            .audit
            .record(
                Some((ctx.user_id, &ctx.username)),
                action,
                "Enrollment cancelled".to_string(),
                Some(client_ip),
                Some(serde_json::json!({
                    "event_id": enrollment.event_id,
                    "enrollment_id": enrollment.id,
                })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write cancellation audit record");
        }
    }
}
