//! Certificate repository (数据库访问层)

use crate::{
    error::AppError,
    models::certificate::{Certificate, CertificateWithContext},
};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// 证书上下文查询共用的 SELECT 前缀：证书 + 参与者 + 事件 + 签发人
const CERTIFICATE_CONTEXT_SELECT: &str = r#"
    SELECT
        c.id, c.enrollment_id, c.verification_code, c.issued_at, c.pdf_path,
        pu.id AS participant_id,
        (pu.first_name || ' ' || pu.last_name) AS participant_name,
        e.id AS event_id, e.title AS event_title, e.kind AS event_kind,
        e.start_date, e.end_date,
        (iu.first_name || ' ' || iu.last_name) AS issuer_name
    FROM certificates c
    JOIN enrollments en ON en.id = c.enrollment_id
    JOIN users pu ON pu.id = en.user_id
    JOIN events e ON e.id = en.event_id
    JOIN users iu ON iu.id = c.issued_by
"#;

pub struct CertificateRepository {
    db: PgPool,
}

impl CertificateRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 签发证书
    pub async fn insert(
        &self,
        enrollment_id: Uuid,
        verification_code: &str,
        issued_by: Uuid,
    ) -> Result<Certificate, AppError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            r#"
            INSERT INTO certificates (enrollment_id, verification_code, issued_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(enrollment_id)
        .bind(verification_code)
        .bind(issued_by)
        .fetch_one(&self.db)
        .await?;

        Ok(certificate)
    }

    /// 某报名是否已签发证书
    pub async fn find_by_enrollment(
        &self,
        enrollment_id: Uuid,
    ) -> Result<Option<Certificate>, AppError> {
        let certificate =
            sqlx::query_as::<_, Certificate>("SELECT * FROM certificates WHERE enrollment_id = $1")
                .bind(enrollment_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(certificate)
    }

    /// 根据 ID 查找证书（附带上下文）
    pub async fn find_with_context(
        &self,
        id: &Uuid,
    ) -> Result<Option<CertificateWithContext>, AppError> {
        let query = format!("{} WHERE c.id = $1", CERTIFICATE_CONTEXT_SELECT);

        let certificate = sqlx::query_as::<_, CertificateWithContext>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(certificate)
    }

    /// 根据验证码查找证书（附带上下文）
    pub async fn find_by_code(
        &self,
        verification_code: &str,
    ) -> Result<Option<CertificateWithContext>, AppError> {
        let query = format!("{} WHERE c.verification_code = $1", CERTIFICATE_CONTEXT_SELECT);

        let certificate = sqlx::query_as::<_, CertificateWithContext>(&query)
            .bind(verification_code)
            .fetch_optional(&self.db)
            .await?;

        Ok(certificate)
    }

    /// 某用户的全部证书
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<CertificateWithContext>, AppError> {
        let query = format!(
            "{} WHERE en.user_id = $1 ORDER BY c.issued_at DESC",
            CERTIFICATE_CONTEXT_SELECT
        );

        let certificates = sqlx::query_as::<_, CertificateWithContext>(&query)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        Ok(certificates)
    }

    /// 某签发人签发的证书数量（仪表盘）
    pub async fn count_by_issuer(&self, issuer_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM certificates WHERE issued_by = $1")
            .bind(issuer_id)
            .fetch_one(&self.db)
            .await?
            .get(0);

        Ok(count)
    }
}
