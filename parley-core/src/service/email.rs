//! Outbound email: meeting reminders and invitations.
//!
//! SMTP via `lettre`. When SMTP is not configured the service still
//! constructs, and every send degrades to a logged no-op so the rest of the
//! system (reminder scheduler, invites) is unaffected.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, warn};

use crate::config::EmailConfig;
use crate::{Error, Result};

/// Mask an email address for safe logging: `user***@example.com`
fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let local = &email[..at_pos];
        let domain = &email[at_pos..];
        let visible = local.len().min(3);
        format!("{}***{}", &local[..visible], domain)
    } else {
        "***".to_string()
    }
}

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("configured", &self.transport.is_some())
            .finish()
    }
}

impl EmailService {
    /// Build the service from config. Returns an unconfigured (no-op)
    /// service when `smtp_host` is empty.
    pub fn new(config: &EmailConfig) -> Result<Self> {
        if config.smtp_host.is_empty() {
            return Ok(Self {
                transport: None,
                from: None,
            });
        }

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| Error::Internal(format!("SMTP transport: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal(format!("Invalid from address: {e}")))?;

        Ok(Self {
            transport: Some(transport),
            from: Some(from),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// One reminder email to one recipient.
    pub async fn send_reminder(
        &self,
        to: &str,
        meeting_title: &str,
        meeting_code: &str,
        minutes_before: i32,
    ) -> Result<()> {
        let subject = format!("Reminder: \"{meeting_title}\" starts in {minutes_before} minutes");
        let body = format!(
            "Your meeting \"{meeting_title}\" starts in {minutes_before} minutes.\n\n\
             Join with code: {meeting_code}\n"
        );
        self.send(to, &subject, &body).await
    }

    /// Invitation email with the join code.
    pub async fn send_invitation(
        &self,
        to: &str,
        inviter_name: &str,
        meeting_title: &str,
        meeting_code: &str,
    ) -> Result<()> {
        let subject = format!("{inviter_name} invited you to \"{meeting_title}\"");
        let body = format!(
            "{inviter_name} invited you to the meeting \"{meeting_title}\".\n\n\
             Join with code: {meeting_code}\n"
        );
        self.send(to, &subject, &body).await
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            warn!(to = %mask_email(to), "Email not configured, dropping message");
            return Ok(());
        };

        let to_mailbox = to
            .parse::<Mailbox>()
            .map_err(|e| Error::InvalidArgument(format!("Invalid email address: {e}")))?;

        let message = Message::builder()
            .from(from.clone())
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::Internal(format!("Failed to build email: {e}")))?;

        transport
            .send(message)
            .await
            .map_err(|e| Error::Upstream(format!("SMTP send failed: {e}")))?;

        debug!(to = %mask_email(to), "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "ali***@example.com");
        assert_eq!(mask_email("ab@example.com"), "ab***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[tokio::test]
    async fn test_unconfigured_send_is_noop() {
        let service = EmailService::new(&EmailConfig::default()).unwrap();
        assert!(!service.is_configured());

        // Degrades to Ok without a transport
        service
            .send_reminder("bob@example.com", "Standup", "abc-defg-hij", 15)
            .await
            .unwrap();
    }

    #[test]
    fn test_configured_with_bad_from_fails() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            from_email: "not an address".to_string(),
            ..EmailConfig::default()
        };
        assert!(EmailService::new(&config).is_err());
    }
}
