//! Business logic services layer

pub mod audit_service;
pub mod auth_service;
pub mod certificate_service;
pub mod enrollment_service;
pub mod event_service;
pub mod notification_service;
pub mod quota_service;

pub use audit_service::{AuditAction, AuditService};
pub use auth_service::AuthService;
pub use certificate_service::CertificateService;
pub use enrollment_service::EnrollmentService;
pub use event_service::EventService;
pub use notification_service::NotificationService;
pub use quota_service::{QuotaScope, QuotaService};
