//! Email service for overdue loan notifications

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

/// Outbound mail transport
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Send one plain-text message to every recipient
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> AppResult<()>;
}

/// SMTP transport configured from the `email` section
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, subject: &str, body: &str, recipients: &[String]) -> AppResult<Message> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Library");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Mail(format!("Invalid from address: {}", e)))?;

        let mut builder = Message::builder().from(from_mailbox).subject(subject);
        for to in recipients {
            let to_mailbox = Mailbox::from_str(to)
                .map_err(|e| AppError::Mail(format!("Invalid to address {}: {}", to, e)))?;
            builder = builder.to(to_mailbox);
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Mail(format!("Failed to build email: {}", e)))
    }

    fn transport(&self) -> AppResult<SmtpTransport> {
        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Mail(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        Ok(mailer_builder.build())
    }
}

#[async_trait]
impl MailSender for EmailService {
    async fn send(&self, subject: &str, body: &str, recipients: &[String]) -> AppResult<()> {
        if recipients.is_empty() {
            return Err(AppError::Mail("No recipients".to_string()));
        }

        let email = self.build_message(subject, body, recipients)?;
        let mailer = self.transport()?;

        // lettre's SMTP transport blocks
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Mail task failed: {}", e)))?
            .map_err(|e| AppError::Mail(format!("Failed to send email: {}", e)))?;

        tracing::info!(recipients = recipients.len(), subject, "Email sent");
        Ok(())
    }
}
