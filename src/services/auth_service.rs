//! 认证服务：注册、邮箱确认、登录、登出、API 令牌签发

use crate::{
    auth::{jwt::JwtService, password::PasswordHasher},
    config::AppConfig,
    error::AppError,
    models::{
        auth::{ApiTokenRequest, ApiTokenResponse, LoginRequest, LoginResponse, Session},
        user::{RegisterRequest, User, UserResponse},
    },
    repository::{session_repo::SessionRepository, user_repo::UserRepository},
    services::{audit_service::AuditAction, AuditService, NotificationService},
};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct AuthService {
    db: PgPool,
    jwt_service: Arc<JwtService>,
    config: Arc<AppConfig>,
    audit: Arc<AuditService>,
    notifier: Arc<NotificationService>,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        jwt_service: Arc<JwtService>,
        config: Arc<AppConfig>,
        audit: Arc<AuditService>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            db,
            jwt_service,
            config,
            audit,
            notifier,
        }
    }

    /// 用户注册
    pub async fn register(
        &self,
        req: RegisterRequest,
        client_ip: &str,
    ) -> Result<UserResponse, AppError> {
        req.validate()?;

        // 长度策略来自配置，强度规则在字段校验器里
        PasswordHasher::validate_password_policy(&req.password, &self.config)?;

        // 学生与教师必须填写所属机构
        if req.role.requires_institution()
            && req.institution.as_deref().map_or(true, |i| i.trim().is_empty())
        {
            return Err(AppError::validation(
                "institution: is required for students and professors",
            ));
        }

        let user_repo = UserRepository::new(self.db.clone());

        if user_repo.find_by_username(&req.username).await?.is_some() {
            return Err(AppError::validation("username: is already taken"));
        }

        if user_repo.find_by_email(&req.email).await?.is_some() {
            return Err(AppError::validation("email: is already registered"));
        }

        let hasher = PasswordHasher::new();
        let password_hash = hasher.hash(&req.password)?;
        let confirmation_token = Uuid::new_v4().to_string();

        let user = user_repo.create(&req, &password_hash, &confirmation_token).await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            "User registered"
        );

        // 提交后的副作用：审计与欢迎通知，失败不影响注册结果
        if let Err(err) = self
            .audit
            .record(
                Some((user.id, &user.username)),
                AuditAction::UserRegister,
                format!("New user registered: {} ({})", user.username, user.role),
                Some(client_ip),
                Some(serde_json::json!({ "role": user.role.clone(), "email": user.email.clone() })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write registration audit record");
        }

        self.notifier
            .send_welcome(&user.email, &user.full_name(), &confirmation_token);

        Ok(UserResponse::from(user))
    }

    /// 邮箱确认：按令牌查找用户并标记已确认
    pub async fn confirm_email(&self, token: &str, client_ip: &str) -> Result<UserResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let user = user_repo
            .find_by_confirmation_token(token)
            .await?
            .ok_or_else(|| AppError::not_found("confirmation token"))?;

        user_repo.confirm_email(user.id).await?;

        if let Err(err) = self
            .audit
            .record(
                Some((user.id, &user.username)),
                AuditAction::UserEmailConfirm,
                format!("Email confirmed for user: {}", user.username),
                Some(client_ip),
                None,
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write email confirmation audit record");
        }

        let user = user_repo
            .find_by_id(&user.id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        Ok(UserResponse::from(user))
    }

    /// Web 登录：校验口令并创建会话
    pub async fn login(
        &self,
        req: LoginRequest,
        client_ip: &str,
        user_agent: Option<&str>,
    ) -> Result<LoginResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let user: User = user_repo
            .find_by_username(&req.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        // 检查账户是否被锁定
        if let Some(locked_until) = user.locked_until {
            if locked_until > chrono::Utc::now() {
                self.record_login_failure(&user, "account_locked", client_ip).await;
                return Err(AppError::bad_request("Account temporarily locked"));
            }
        }

        // 验证密码；失败时累计并在达到阈值后锁定
        let hasher = PasswordHasher::new();
        if hasher.verify(&req.password, &user.password_hash).is_err() {
            user_repo.increment_failed_attempts(user.id).await?;

            let attempts = user.failed_login_attempts + 1;
            if attempts >= self.config.security.max_login_attempts as i32 {
                let locked_until = chrono::Utc::now()
                    + chrono::Duration::seconds(
                        self.config.security.login_lockout_duration_secs as i64,
                    );
                user_repo.lock_account(user.id, locked_until).await?;
                tracing::warn!(
                    user_id = %user.id,
                    attempts = attempts,
                    "Account locked after repeated login failures"
                );
            }

            self.record_login_failure(&user, "invalid_password", client_ip).await;
            return Err(AppError::Unauthorized);
        }

        if user.failed_login_attempts > 0 {
            let _ = user_repo.reset_failed_attempts(user.id).await;
        }

        // 创建会话
        let session_token = generate_session_token();
        let expires_at = chrono::Utc::now()
            + chrono::Duration::seconds(self.config.security.session_ttl_secs as i64);

        let session = Session {
            id: Uuid::new_v4(),
            token_hash: SessionRepository::hash_token(&session_token),
            user_id: user.id,
            user_agent: user_agent.map(|s| s.to_string()),
            ip_address: client_ip.to_string(),
            expires_at,
            revoked_at: None,
            created_at: chrono::Utc::now(),
        };

        SessionRepository::new(self.db.clone()).store(&session).await?;

        if let Err(err) = self
            .audit
            .record(
                Some((user.id, &user.username)),
                AuditAction::UserLogin,
                format!("User logged in: {}", user.username),
                Some(client_ip),
                None,
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write login audit record");
        }

        Ok(LoginResponse {
            session_token,
            expires_at,
            user: UserResponse::from(user),
        })
    }

    /// Web 登出：撤销当前会话
    pub async fn logout(&self, session_token: &str, user_id: Uuid, username: &str) -> Result<(), AppError> {
        let session_repo = SessionRepository::new(self.db.clone());
        let token_hash = SessionRepository::hash_token(session_token);

        session_repo.revoke_by_hash(&token_hash, user_id).await?;

        if let Err(err) = self
            .audit
            .record(
                Some((user_id, username)),
                AuditAction::UserLogout,
                format!("User logged out: {}", username),
                None,
                None,
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write logout audit record");
        }

        Ok(())
    }

    /// API 令牌签发：同一凭据检查，返回 Bearer JWT
    pub async fn issue_api_token(
        &self,
        req: ApiTokenRequest,
        client_ip: &str,
    ) -> Result<ApiTokenResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let user: User = user_repo
            .find_by_username(&req.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if let Some(locked_until) = user.locked_until {
            if locked_until > chrono::Utc::now() {
                self.record_login_failure(&user, "account_locked", client_ip).await;
                return Err(AppError::bad_request("Account temporarily locked"));
            }
        }

        let hasher = PasswordHasher::new();
        if hasher.verify(&req.password, &user.password_hash).is_err() {
            user_repo.increment_failed_attempts(user.id).await?;
            self.record_login_failure(&user, "invalid_password", client_ip).await;
            return Err(AppError::Unauthorized);
        }

        if user.failed_login_attempts > 0 {
            let _ = user_repo.reset_failed_attempts(user.id).await;
        }

        let access_token =
            self.jwt_service
                .generate_access_token(&user.id, &user.username, &user.role)?;

        if let Err(err) = self
            .audit
            .record(
                Some((user.id, &user.username)),
                AuditAction::UserLogin,
                format!("API token issued for user: {}", user.username),
                Some(client_ip),
                Some(serde_json::json!({ "channel": "api" })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write API login audit record");
        }

        Ok(ApiTokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_exp_secs(),
        })
    }

    async fn record_login_failure(&self, user: &User, reason: &str, client_ip: &str) {
        if let Err(err) = self
            .audit
            .record(
                Some((user.id, &user.username)),
                AuditAction::UserLogin,
                format!("Login failed for user {}: {}", user.username, reason),
                Some(client_ip),
                Some(serde_json::json!({ "result": "failure", "reason": reason })),
            )
            .await
        {
            tracing::warn!(error = %err, "Failed to write login failure audit record");
        }
    }
}

/// 生成不透明会话令牌（48 位字母数字）
fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
