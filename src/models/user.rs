//! User domain models

use crate::validators;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub institution: Option<String>,

    pub role: String, // student, professor, organizer

    // Email confirmation
    pub email_confirmed: bool,
    pub confirmation_token: Option<String>,

    // Login lockout state
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.clone())
    }
}

/// User role enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Professor,
    Organizer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Professor => "professor",
            UserRole::Organizer => "organizer",
        }
    }

    /// 学生与教师必须填写所属机构
    pub fn requires_institution(&self) -> bool {
        matches!(self, UserRole::Student | UserRole::Professor)
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "professor" => UserRole::Professor,
            "organizer" => UserRole::Organizer,
            _ => UserRole::Student,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

/// Signup request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "must be between 3 and 150 characters"))]
    pub username: String,

    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[validate(custom(function = validators::validate_strong_password))]
    pub password: String,

    #[validate(length(min = 1, max = 150, message = "is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 150, message = "is required"))]
    pub last_name: String,

    #[validate(custom(function = validators::validate_phone))]
    pub phone: String,

    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub institution: Option<String>,

    pub role: UserRole,
}

/// User response (without sensitive data)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub institution: Option<String>,
    pub role: UserRole,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let full_name = user.full_name();
        let role = user.role();
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name,
            phone: user.phone,
            institution: user.institution,
            role,
            email_confirmed: user.email_confirmed,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Student, UserRole::Professor, UserRole::Organizer] {
            let s: String = role.into();
            assert_eq!(UserRole::from(s), role);
        }
    }

    #[test]
    fn test_unknown_role_defaults_to_student() {
        assert_eq!(UserRole::from("administrator".to_string()), UserRole::Student);
    }

    #[test]
    fn test_institution_requirement() {
        assert!(UserRole::Student.requires_institution());
        assert!(UserRole::Professor.requires_institution());
        assert!(!UserRole::Organizer.requires_institution());
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            username: "maria.silva".to_string(),
            email: "maria@example.edu".to_string(),
            password: "Passw0rd!".to_string(),
            first_name: "Maria".to_string(),
            last_name: "Silva".to_string(),
            phone: "(11) 98765-4321".to_string(),
            institution: Some("UFRJ".to_string()),
            role: UserRole::Student,
        };
        assert!(req.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..req.clone()
        };
        assert!(bad_email.validate().is_err());

        let weak_password = RegisterRequest {
            password: "abc".to_string(),
            ..req
        };
        assert!(weak_password.validate().is_err());
    }
}
