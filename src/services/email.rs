//! Email notifications
//!
//! Delivery is fire-and-forget: `notify` returns immediately, the SMTP
//! exchange runs on a background task, and failures are only logged.

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

/// Outbound notification channel
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Queue a message for delivery; never blocks and never reports failure
    fn notify(&self, recipients: Vec<String>, subject: String, body: String);
}

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn enabled(&self) -> bool {
        !self.config.smtp_host.trim().is_empty()
    }

    fn build_message(config: &EmailConfig, to: &[String], subject: &str, body: &str) -> AppResult<Message> {
        let from_name = config.smtp_from_name.as_deref().unwrap_or("GearGuard");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let mut builder = Message::builder().from(from_mailbox).subject(subject);
        for recipient in to {
            let mailbox = Mailbox::from_str(recipient)
                .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;
            builder = builder.to(mailbox);
        }

        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body(body)),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }

    /// Blocking SMTP send
    fn send_email(config: &EmailConfig, to: &[String], subject: &str, body: &str) -> AppResult<()> {
        let email = Self::build_message(config, to, subject, body)?;

        let mailer_builder = if config.smtp_use_tls {
            SmtpTransport::starttls_relay(&config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&config.smtp_host)
        }
        .port(config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) =
            (&config.smtp_username, &config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        mailer_builder
            .build()
            .send(&email)
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

impl Notifier for EmailService {
    fn notify(&self, recipients: Vec<String>, subject: String, body: String) {
        if recipients.is_empty() {
            return;
        }

        if !self.enabled() {
            tracing::info!(?recipients, %subject, "SMTP not configured, email not sent");
            tracing::debug!(%body, "Unsent email body");
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(?recipients, %subject, "No async runtime, email dropped");
            return;
        };

        let config = self.config.clone();
        handle.spawn(async move {
            let to = recipients.clone();
            let result = tokio::task::spawn_blocking(move || {
                Self::send_email(&config, &to, &subject, &body)
            })
            .await;

            match result {
                Ok(Ok(())) => tracing::info!(?recipients, "Email sent"),
                Ok(Err(e)) => tracing::warn!(?recipients, error = %e, "Failed to send email"),
                Err(e) => tracing::warn!(?recipients, error = %e, "Email task aborted"),
            }
        });
    }
}

/// Messages sent when a maintenance request is logged
pub fn request_created_messages(
    technician_email: Option<&str>,
    creator_email: Option<&str>,
    subject: &str,
    equipment_name: &str,
) -> Vec<(String, String, String)> {
    let mut messages = Vec::new();

    if let Some(email) = technician_email.filter(|e| !e.is_empty()) {
        messages.push((
            email.to_string(),
            format!("New Maintenance Task: {}", subject),
            format!(
                "New Task Assigned\n\nYou have been assigned to check {}.\nIssue: {}\n",
                equipment_name, subject
            ),
        ));
    }

    if let Some(email) = creator_email.filter(|e| !e.is_empty()) {
        messages.push((
            email.to_string(),
            format!("Request Confirmation: {}", subject),
            format!(
                "Request Received\n\nYour request for {} has been logged.\n",
                equipment_name
            ),
        ));
    }

    messages
}

/// Password reset message body
pub fn password_reset_body(link: &str, ttl_minutes: i64) -> String {
    format!(
        "Password Reset Request\n\nFollow the link below to reset your password:\n{}\n\nThis link expires in {} minutes.\nIf you didn't request a reset, you can ignore this email.\n",
        link, ttl_minutes
    )
}

/// HTML alternative of a plain-text body; request subjects are user input
fn html_body(body: &str) -> String {
    let escaped = body
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        r#"<html><body><pre>{}</pre></body></html>"#,
        escaped.replace('\n', "<br>")
    )
}
