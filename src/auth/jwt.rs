//! JWT access-token generation and validation for the REST API

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for API access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Username
    pub username: String,

    /// User role
    pub role: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // HS256 requires a reasonably long secret
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_exp_secs: config.security.access_token_exp_secs,
        })
    }

    /// Seconds until a freshly issued token expires
    pub fn access_token_exp_secs(&self) -> u64 {
        self.access_token_exp_secs
    }

    /// Generate access token
    pub fn generate_access_token(
        &self,
        user_id: &Uuid,
        username: &str,
        role: &str,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.access_token_exp_secs as i64);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Validate and decode an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::Unauthorized
            })?
            .claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use serial_test::serial;

    fn test_config() -> AppConfig {
        std::env::set_var("SGEA_DATABASE__URL", "postgresql://localhost/test");
        std::env::set_var(
            "SGEA_SECURITY__JWT_SECRET",
            "test_secret_key_32_characters_long!",
        );
        let config = AppConfig::from_env().unwrap();
        std::env::remove_var("SGEA_DATABASE__URL");
        std::env::remove_var("SGEA_SECURITY__JWT_SECRET");
        config
    }

    #[test]
    #[serial]
    fn test_generate_and_validate_access_token() {
        let service = JwtService::from_config(&test_config()).unwrap();
        let user_id = Uuid::new_v4();

        let token = service
            .generate_access_token(&user_id, "testuser", "organizer")
            .unwrap();

        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.role, "organizer");
    }

    #[test]
    #[serial]
    fn test_invalid_token_fails() {
        let service = JwtService::from_config(&test_config()).unwrap();
        assert!(service.validate_access_token("invalid_token").is_err());
    }

    #[test]
    #[serial]
    fn test_token_from_other_secret_rejected() {
        std::env::set_var("SGEA_DATABASE__URL", "postgresql://localhost/test");
        std::env::set_var(
            "SGEA_SECURITY__JWT_SECRET",
            "another_secret_key_32_characters_x!",
        );
        let other_config = AppConfig::from_env().unwrap();
        std::env::remove_var("SGEA_DATABASE__URL");
        std::env::remove_var("SGEA_SECURITY__JWT_SECRET");

        let issuer = JwtService::from_config(&other_config).unwrap();
        let verifier = JwtService::from_config(&test_config()).unwrap();

        let token = issuer
            .generate_access_token(&Uuid::new_v4(), "testuser", "student")
            .unwrap();

        assert!(verifier.validate_access_token(&token).is_err());
    }
}
