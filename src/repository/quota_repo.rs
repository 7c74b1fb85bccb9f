//! API quota repository (配额数据访问)

use crate::error::AppError;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

pub struct QuotaRepository {
    db: PgPool,
}

impl QuotaRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 原子递增并返回当日计数
    pub async fn increment(
        &self,
        user_id: Uuid,
        scope: &str,
        day: NaiveDate,
    ) -> Result<i32, AppError> {
        let count: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO api_usage (user_id, scope, used_on, request_count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (user_id, scope, used_on)
            DO UPDATE SET request_count = api_usage.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(user_id)
        .bind(scope)
        .bind(day)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// 查询当日计数（不递增）
    pub async fn current_count(
        &self,
        user_id: Uuid,
        scope: &str,
        day: NaiveDate,
    ) -> Result<i32, AppError> {
        let count: Option<i32> = sqlx::query_scalar(
            "SELECT request_count FROM api_usage WHERE user_id = $1 AND scope = $2 AND used_on = $3",
        )
        .bind(user_id)
        .bind(scope)
        .bind(day)
        .fetch_optional(&self.db)
        .await?;

        Ok(count.unwrap_or(0))
    }
}
