//! 通知服务
//! 在主操作提交后派发外发消息；邮件传输不在本服务范围内，
//! 消息在此组装并交给日志管道，派发问题不影响主操作。

use crate::config::AppConfig;

pub struct NotificationService {
    enabled: bool,
    from_address: String,
    site_url: String,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            enabled: config.notification.enabled,
            from_address: config.notification.from_address.clone(),
            site_url: config.server.site_url.clone(),
        }
    }

    /// 注册欢迎消息，附邮箱确认链接
    pub fn send_welcome(
        &self,
        recipient: &str,
        full_name: &str,
        confirmation_token: &str,
    ) {
        if !self.enabled {
            tracing::debug!(recipient = %recipient, "Notifications disabled, skipping welcome message");
            return;
        }

        let confirmation_link =
            format!("{}/confirmar-email/{}", self.site_url, confirmation_token);

        self.dispatch(
            recipient,
            "Welcome to SGEA - confirm your email",
            &format!(
                "Hello {}, welcome to SGEA. Confirm your email address at {}",
                full_name, confirmation_link
            ),
        );
    }

    /// 报名确认消息
    pub fn send_enrollment_confirmation(
        &self,
        recipient: &str,
        full_name: &str,
        event_title: &str,
        start_date: chrono::NaiveDate,
    ) {
        if !self.enabled {
            tracing::debug!(recipient = %recipient, "Notifications disabled, skipping enrollment message");
            return;
        }

        self.dispatch(
            recipient,
            &format!("Enrollment confirmed - {}", event_title),
            &format!(
                "Hello {}, your enrollment in \"{}\" (starting {}) is confirmed.",
                full_name, event_title, start_date
            ),
        );
    }

    /// 证书签发消息
    pub fn send_certificate_issued(
        &self,
        recipient: &str,
        full_name: &str,
        event_title: &str,
        verification_code: &str,
    ) {
        if !self.enabled {
            tracing::debug!(recipient = %recipient, "Notifications disabled, skipping certificate message");
            return;
        }

        self.dispatch(
            recipient,
            &format!("Certificate issued - {}", event_title),
            &format!(
                "Hello {}, your certificate for \"{}\" is available. Verification code: {}",
                full_name, event_title, verification_code
            ),
        );
    }

    fn dispatch(&self, recipient: &str, subject: &str, body: &str) {
        tracing::info!(
            from = %self.from_address,
            to = %recipient,
            subject = %subject,
            body_len = body.len(),
            "Notification dispatched"
        );
        metrics::counter!("notifications.dispatched_total").increment(1);
    }
}
