//! API 每日配额服务

use crate::{config::AppConfig, error::AppError, repository::quota_repo::QuotaRepository};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// 配额范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaScope {
    /// 事件查询（列表与详情）
    EventQuery,
    /// 报名创建
    EnrollmentCreate,
}

impl QuotaScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaScope::EventQuery => "event_query",
            QuotaScope::EnrollmentCreate => "enrollment_create",
        }
    }
}

pub struct QuotaService {
    db: PgPool,
    config: Arc<AppConfig>,
}

impl QuotaService {
    pub fn new(db: PgPool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    fn limit_for(&self, scope: QuotaScope) -> i32 {
        match scope {
            QuotaScope::EventQuery => self.config.quota.event_reads_per_day,
            QuotaScope::EnrollmentCreate => self.config.quota.enrollment_creates_per_day,
        }
    }

    /// 计入一次调用并检查当日配额
    pub async fn check_and_count(&self, user_id: Uuid, scope: QuotaScope) -> Result<(), AppError> {
        let repo = QuotaRepository::new(self.db.clone());
        let today = chrono::Utc::now().date_naive();

        let used = repo.increment(user_id, scope.as_str(), today).await?;
        let limit = self.limit_for(scope);

        if used > limit {
            tracing::warn!(
                user_id = %user_id,
                scope = scope.as_str(),
                used = used,
                limit = limit,
                "API quota exceeded"
            );
            metrics::counter!("api.quota_exceeded_total", "scope" => scope.as_str()).increment(1);
            return Err(AppError::RateLimitExceeded);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_names() {
        assert_eq!(QuotaScope::EventQuery.as_str(), "event_query");
        assert_eq!(QuotaScope::EnrollmentCreate.as_str(), "enrollment_create");
    }
}
