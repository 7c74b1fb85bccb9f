//! Audit repository (审计数据访问)
//! 审计日志只追加，不提供更新或删除

use crate::{
    error::AppError,
    models::audit::{AuditLog, AuditLogFilters},
};
use sqlx::{PgPool, Row};

pub struct AuditRepository {
    db: PgPool,
}

impl AuditRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 插入审计日志
    pub async fn insert(&self, log: &AuditLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, actor_id, actor_name, action, description,
                source_ip, payload, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.id)
        .bind(log.actor_id)
        .bind(&log.actor_name)
        .bind(&log.action)
        .bind(&log.description)
        .bind(&log.source_ip)
        .bind(&log.payload)
        .bind(log.occurred_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 查询审计日志
    pub async fn query(
        &self,
        filters: &AuditLogFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let mut query = String::from("SELECT * FROM audit_logs WHERE 1=1");
        let mut index = 0;

        if filters.actor.is_some() {
            index += 1;
            query.push_str(&format!(" AND actor_name ILIKE ${}", index));
        }
        if filters.action.is_some() {
            index += 1;
            query.push_str(&format!(" AND action = ${}", index));
        }
        if filters.day.is_some() {
            index += 1;
            query.push_str(&format!(" AND DATE(occurred_at) = ${}", index));
        }

        query.push_str(&format!(
            " ORDER BY occurred_at DESC LIMIT ${} OFFSET ${}",
            index + 1,
            index + 2
        ));

        let mut query_builder = sqlx::query_as::<_, AuditLog>(&query);

        if let Some(actor) = &filters.actor {
            query_builder = query_builder.bind(format!("%{}%", actor));
        }
        if let Some(action) = &filters.action {
            query_builder = query_builder.bind(action);
        }
        if let Some(day) = filters.day {
            query_builder = query_builder.bind(day);
        }

        let logs = query_builder.bind(limit).bind(offset).fetch_all(&self.db).await?;

        Ok(logs)
    }

    /// 统计审计日志数量
    pub async fn count(&self, filters: &AuditLogFilters) -> Result<i64, AppError> {
        let mut query = String::from("SELECT COUNT(*) FROM audit_logs WHERE 1=1");
        let mut index = 0;

        if filters.actor.is_some() {
            index += 1;
            query.push_str(&format!(" AND actor_name ILIKE ${}", index));
        }
        if filters.action.is_some() {
            index += 1;
            query.push_str(&format!(" AND action = ${}", index));
        }
        if filters.day.is_some() {
            index += 1;
            query.push_str(&format!(" AND DATE(occurred_at) = ${}", index));
        }

        let mut query_builder = sqlx::query(&query);

        if let Some(actor) = &filters.actor {
            query_builder = query_builder.bind(format!("%{}%", actor));
        }
        if let Some(action) = &filters.action {
            query_builder = query_builder.bind(action);
        }
        if let Some(day) = filters.day {
            query_builder = query_builder.bind(day);
        }

        let count: i64 = query_builder.fetch_one(&self.db).await?.get(0);
        Ok(count)
    }
}
