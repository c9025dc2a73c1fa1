/// Email service for delivering one-time passcodes
use std::sync::Arc;

use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{info, warn};

use crate::config::EmailSettings;
use crate::error::{AppError, Result};

/// Async SMTP transport wrapper. With no SMTP host configured it runs in
/// no-op mode and only logs, which keeps development and tests free of
/// email infrastructure.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl EmailService {
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid SMTP from address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; email service will operate in no-op mode");
            None
        } else {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(
                &config.smtp_host,
            )
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to configure SMTP transport: {}", e))
            })?
            .port(config.smtp_port);

            if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password)
            {
                builder =
                    builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    /// Send a one-time passcode. In no-op mode the code is logged instead
    /// of delivered; with a real transport only a masked recipient is
    /// recorded.
    pub async fn send_otp_email(&self, to: &str, code: u32, ttl_minutes: i64) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(
                email = %mask_email(to),
                code = code,
                "No-op mailer: verification code not delivered"
            );
            return Ok(());
        };

        let text_body = format!(
            "Your verification code is {}.\n\nIt expires in {} minutes. \
             If you did not request it, you can ignore this email.",
            code, ttl_minutes
        );
        let html_body = format!(
            r#"<html><body style="font-family: sans-serif; color: #333;">
<p>Your verification code is:</p>
<p style="font-size: 32px; font-weight: bold; letter-spacing: 8px;">{}</p>
<p>It expires in <strong>{} minutes</strong>.</p>
<p style="color: #999; font-size: 12px;">If you did not request it, you can ignore this email.</p>
</body></html>"#,
            code, ttl_minutes
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse::<Mailbox>()
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid recipient: {}", e)))?)
            .subject("Your verification code")
            .multipart(MultiPart::alternative_plain_html(text_body, html_body))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build email: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to send email: {}", e)))?;

        info!(email = %mask_email(to), "Verification code sent");
        Ok(())
    }
}

/// Mask an email address for logging.
pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let local = &email[..at_pos];
        let domain = &email[at_pos..];
        match local.chars().next() {
            Some(first) if local.chars().count() > 2 => format!("{}***{}", first, domain),
            _ => format!("**{}", domain),
        }
    } else {
        "***@***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_addresses() {
        assert_eq!(mask_email("alice@x.com"), "a***@x.com");
        assert_eq!(mask_email("ab@x.com"), "**@x.com");
        assert_eq!(mask_email("not-an-email"), "***@***");
    }

    #[test]
    fn masks_non_ascii_local_parts() {
        assert_eq!(mask_email("žofia@x.com"), "ž***@x.com");
        assert_eq!(mask_email("žo@x.com"), "**@x.com");
        assert_eq!(mask_email("@x.com"), "**@x.com");
    }
}
