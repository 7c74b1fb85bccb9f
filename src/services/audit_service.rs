//! 审计日志服务

use crate::{
    error::AppError,
    models::audit::{AuditLog, AuditLogFilters},
    repository::audit_repo::AuditRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

/// 审计操作类型
#[derive(Debug, Clone, Copy)]
pub enum AuditAction {
    // 用户相关
    UserRegister,
    UserLogin,
    UserLogout,
    UserEmailConfirm,

    // 事件相关
    EventCreate,
    EventUpdate,
    EventDelete,

    // 报名相关
    EnrollmentCreate,
    EnrollmentCancel,

    // 证书相关
    CertificateIssue,
    CertificateVerify,

    // API 相关
    ApiEventQuery,
    ApiEnrollmentCreate,
    ApiEnrollmentCancel,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user.register",
            AuditAction::UserLogin => "user.login",
            AuditAction::UserLogout => "user.logout",
            AuditAction::UserEmailConfirm => "user.email_confirm",

            AuditAction::EventCreate => "event.create",
            AuditAction::EventUpdate => "event.update",
            AuditAction::EventDelete => "event.delete",

            AuditAction::EnrollmentCreate => "enrollment.create",
            AuditAction::EnrollmentCancel => "enrollment.cancel",

            AuditAction::CertificateIssue => "certificate.issue",
            AuditAction::CertificateVerify => "certificate.verify",

            AuditAction::ApiEventQuery => "api.event_query",
            AuditAction::ApiEnrollmentCreate => "api.enrollment_create",
            AuditAction::ApiEnrollmentCancel => "api.enrollment_cancel",
        }
    }
}

pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 记录一条审计日志
    ///
    /// 调用方在主操作提交后调用；写入失败由调用方记日志并吞掉，
    /// 不得影响主操作的结果。
    pub async fn record(
        &self,
        actor: Option<(Uuid, &str)>,
        action: AuditAction,
        description: impl Into<String>,
        source_ip: Option<&str>,
        payload: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        let log = AuditLog {
            id: Uuid::new_v4(),
            actor_id: actor.map(|(id, _)| id),
            actor_name: actor.map(|(_, name)| name.to_string()),
            action: action.as_str().to_string(),
            description: description.into(),
            source_ip: source_ip.map(|s| s.to_string()),
            payload,
            occurred_at: chrono::Utc::now(),
        };

        let repo = AuditRepository::new(self.db.clone());
        repo.insert(&log).await?;

        metrics::counter!("audit.records_total", "action" => log.action.clone()).increment(1);

        Ok(())
    }

    /// 查询审计日志
    pub async fn query_logs(
        &self,
        filters: &AuditLogFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let repo = AuditRepository::new(self.db.clone());
        repo.query(filters, limit, offset).await
    }

    /// 查询审计日志数量
    pub async fn count_logs(&self, filters: &AuditLogFilters) -> Result<i64, AppError> {
        let repo = AuditRepository::new(self.db.clone());
        repo.count(filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_action_names() {
        assert_eq!(AuditAction::UserRegister.as_str(), "user.register");
        assert_eq!(AuditAction::EnrollmentCancel.as_str(), "enrollment.cancel");
        assert_eq!(AuditAction::CertificateVerify.as_str(), "certificate.verify");
        assert_eq!(AuditAction::ApiEventQuery.as_str(), "api.event_query");
    }
}
