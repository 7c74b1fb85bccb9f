//! 证书服务：签发、验证与下载

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    models::certificate::{CertificateResponse, VerificationResponse},
    repository::{
        certificate_repo::CertificateRepository, enrollment_repo::EnrollmentRepository,
        event_repo::EventRepository, user_repo::UserRepository,
    },
    services::{audit_service::AuditAction, AuditService, NotificationService},
};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct CertificateService {
    db: PgPool,
    audit: Arc<AuditService>,
    notifier: Arc<NotificationService>,
}

impl CertificateService {
    pub fn new(db: PgPool, audit: Arc<AuditService>, notifier: Arc<NotificationService>) -> Self {
        Self {
            db,
            audit,
            notifier,
        }
    }

    /// 签发证书：仅事件所属组织者，仅有效报名，每报名一张
    pub async fn issue(
        &self,
        ctx: &AuthContext,
        enrollment_id: Uuid,
        client_ip: &str,
    ) -> Result<CertificateResponse, AppError> {
        let enrollment = EnrollmentRepository::new(self.db.clone())
            .find_by_id(&enrollment_id)
            .await?
            .ok_or_else(|| AppError::not_found("enrollment"))?;

        let event = EventRepository::new(self.db.clone())
            .find_by_id(&enrollment.event_id)
            .await?
            .ok_or_else(|| AppError::not_found("event"))?;

        if event.organizer_id != ctx.user_id {
            return Err(AppError::Forbidden);
        }

        if !enrollment.active {
            return Err(AppError::validation(
                "enrollment: cannot issue a certificate for a cancelled enrollment",
            ));
        }

        let cert_repo = CertificateRepository::new(self.db.clone());

        if cert_repo.find_by_enrollment(enrollment.id).await?.is_some() {
            return Err(AppError::validation(
                "certificate: already issued for this enrollment",
            ));
        }

        let verification_code = generate_verification_code();
        let certificate = cert_repo
            .insert(enrollment.id, &verification_code, ctx.user_id)
            .await?;

        tracing::info!(
            certificate_id = %certificate.id,
            enrollment_id = %enrollment.id,
            code = %verification_code,
            "Certificate issued"
        );

        if let Err(err) = self
            .audit
            .record(
                Some((ctx.user_id, &ctx.username)),
                AuditAction::CertificateIssue,
                format!("Certificate issued for event: {}", event.title),
                Some(client_ip),
                Some(serde_json::json!({
                    "certificate_id": certificate.id,
                    "code": verification_code.clone(),
                    "event_id": event.id,
                })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write certificate issuance audit record");
        }

        // 通知参与者
        if let Some(participant) = UserRepository::new(self.db.clone())
            .find_by_id(&enrollment.user_id)
            .await?
        {
            self.notifier.send_certificate_issued(
                &participant.email,
                &participant.full_name(),
                &event.title,
                &verification_code,
            );
        }

        let row = cert_repo
            .find_with_context(&certificate.id)
            .await?
            .ok_or_else(|| AppError::not_found("certificate"))?;

        Ok(CertificateResponse::from(row))
    }

    /// 公开验证：按验证码查询，无论结果如何都记入审计
    pub async fn verify(
        &self,
        code: &str,
        viewer: Option<&AuthContext>,
        client_ip: &str,
    ) -> Result<VerificationResponse, AppError> {
        let found = CertificateRepository::new(self.db.clone()).find_by_code(code).await?;
        let valid = found.is_some();

        if let Err(err) = self
            .audit
            .record(
                viewer.map(|ctx| (ctx.user_id, ctx.username.as_str())),
                AuditAction::CertificateVerify,
                format!("Certificate verification for code: {}", code),
                Some(client_ip),
                Some(serde_json::json!({ "code": code, "valid": valid })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write verification audit record");
        }

        Ok(VerificationResponse {
            valid,
            code: code.to_string(),
            certificate: found.map(CertificateResponse::from),
        })
    }

    /// 下载证书文档：仅限证书归属的参与者
    pub async fn download(
        &self,
        ctx: &AuthContext,
        certificate_id: Uuid,
    ) -> Result<CertificateResponse, AppError> {
        let row = CertificateRepository::new(self.db.clone())
            .find_with_context(&certificate_id)
            .await?
            .ok_or_else(|| AppError::not_found("certificate"))?;

        if row.participant_id != ctx.user_id {
            return Err(AppError::Forbidden);
        }

        Ok(CertificateResponse::from(row))
    }

    /// 我的证书列表
    pub async fn my_certificates(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<CertificateResponse>, AppError> {
        let rows = CertificateRepository::new(self.db.clone())
            .list_by_user(ctx.user_id)
            .await?;

        Ok(rows.into_iter().map(CertificateResponse::from).collect())
    }
}

/// 生成全局唯一的验证码（随机 20 位字母数字，带固定前缀）
fn generate_verification_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();

    format!("SGEA-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_verification_code_format() {
        let code = generate_verification_code();
        assert!(code.starts_with("SGEA-"));
        assert_eq!(code.len(), 25);
        assert!(code["SGEA-".len()..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_verification_codes_do_not_repeat() {
        let codes: HashSet<String> = (0..200).map(|_| generate_verification_code()).collect();
        assert_eq!(codes.len(), 200);
    }
}
