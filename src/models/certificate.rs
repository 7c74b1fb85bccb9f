//! Certificate domain models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Completion certificate, one per enrollment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Certificate {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub verification_code: String,
    pub issued_by: Uuid,
    pub pdf_path: Option<String>,
    pub issued_at: DateTime<Utc>,
}

/// 证书行附带事件与参与者上下文（下载/验证/列表）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CertificateWithContext {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub verification_code: String,
    pub issued_at: DateTime<Utc>,
    pub pdf_path: Option<String>,
    pub participant_id: Uuid,
    pub participant_name: String,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_kind: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub issuer_name: String,
}

/// Certificate response
#[derive(Debug, Serialize)]
pub struct CertificateResponse {
    pub id: Uuid,
    pub verification_code: String,
    pub issued_at: DateTime<Utc>,
    pub participant_name: String,
    pub event_id: Uuid,
    pub event_title: String,
    pub event_kind: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub issuer_name: String,
    pub pdf_path: Option<String>,
}

impl From<CertificateWithContext> for CertificateResponse {
    fn from(row: CertificateWithContext) -> Self {
        Self {
            id: row.id,
            verification_code: row.verification_code,
            issued_at: row.issued_at,
            participant_name: row.participant_name,
            event_id: row.event_id,
            event_title: row.event_title,
            event_kind: row.event_kind,
            start_date: row.start_date,
            end_date: row.end_date,
            issuer_name: row.issuer_name,
            pdf_path: row.pdf_path,
        }
    }
}

/// Public verification result
#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub valid: bool,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateResponse>,
}
