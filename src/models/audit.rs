//! Audit trail models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit log entry (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub actor_name: Option<String>,
    pub action: String,
    pub description: String,
    pub source_ip: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub occurred_at: DateTime<Utc>,
}

/// Audit log filters
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogFilters {
    /// 按操作者名称模糊匹配
    pub actor: Option<String>,
    pub action: Option<String>,
    /// 只看某一天的记录
    pub day: Option<NaiveDate>,
}
