//! Session repository (会话数据访问)
//! 会话令牌以 SHA-256 哈希存储，原文只在登录响应中出现一次

use crate::{error::AppError, models::auth::Session};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

pub struct SessionRepository {
    db: PgPool,
}

impl SessionRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 计算令牌哈希（十六进制）
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// 存储会话
    pub async fn store(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, token_hash, user_id, user_agent, ip_address, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id)
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(&session.user_agent)
        .bind(&session.ip_address)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 根据哈希查找未撤销且未过期的会话
    pub async fn find_valid_by_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT * FROM sessions
            WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(session)
    }

    /// 根据哈希撤销会话
    pub async fn revoke_by_hash(&self, token_hash: &str, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET revoked_at = NOW()
            WHERE token_hash = $1 AND user_id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 撤销用户的所有会话
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result =
            sqlx::query("UPDATE sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
                .bind(user_id)
                .execute(&self.db)
                .await?;

        Ok(result.rows_affected())
    }

    /// 清理过期会话
    pub async fn cleanup_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_deterministic() {
        let a = SessionRepository::hash_token("my-session-token");
        let b = SessionRepository::hash_token("my-session-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_token_differs_per_token() {
        let a = SessionRepository::hash_token("token-one");
        let b = SessionRepository::hash_token("token-two");
        assert_ne!(a, b);
    }
}
