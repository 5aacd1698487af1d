// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::check::EmailMessage;
use crate::models::config::MonitorConfig;
use crate::services::logging::anonymize_email;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::env;
use std::time::Duration;
use tera::{Context, Tera};
use thiserror::Error;

/// Why an alert email could not be delivered
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP authentication failed: {0}")]
    Auth(String),
    #[error("email delivery failed: {0}")]
    Delivery(String),
    #[error("invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build email message: {0}")]
    Build(String),
    #[error("failed to render email template: {0}")]
    Template(String),
}

/// Sends an alert when keywords were found.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Only called with a non-empty `matched` list.
    async fn notify(&self, matched: &[String], config: &MonitorConfig) -> Result<(), NotifyError>;
}

/// Outbound mail relay settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            timeout: Duration::from_secs(30),
        }
    }
}

impl SmtpSettings {
    /// Load relay settings from environment variables, falling back to Gmail submission.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env::var("SMTP_HOST").unwrap_or(defaults.host),
            port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .context("SMTP_PORT must be a valid port number")?,
            timeout: defaults.timeout,
        })
    }
}

/// Mail body template rendered with tera.
struct EmailTemplate {
    content: &'static str,
    autoescape: bool,
}

impl EmailTemplate {
    const fn new(content: &'static str, autoescape: bool) -> Self {
        Self {
            content,
            autoescape,
        }
    }

    fn render(&self, context: &Context) -> Result<String, NotifyError> {
        Tera::one_off(self.content, context, self.autoescape)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }
}

const ALERT_TEXT_TEMPLATE: EmailTemplate =
    EmailTemplate::new(include_str!("../../templates/emails/keyword_alert.txt"), false);
const ALERT_HTML_TEMPLATE: EmailTemplate =
    EmailTemplate::new(include_str!("../../templates/emails/keyword_alert.html"), true);

/// Build the alert email for a set of matched keywords.
pub fn compose_alert(
    matched: &[String],
    config: &MonitorConfig,
    checked_at: DateTime<Utc>,
) -> Result<EmailMessage, NotifyError> {
    let url = config.target_url.as_str();
    let matched_list = matched.join(", ");

    let mut context = Context::new();
    context.insert("url", url);
    context.insert("matched", matched);
    context.insert("matched_keywords", &matched_list);
    context.insert("searched_keywords", &config.keywords.join(", "));
    context.insert(
        "checked_at",
        &checked_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    Ok(EmailMessage {
        subject: format!("Keyword Alert: {} found on {}", matched_list, url),
        body_text: ALERT_TEXT_TEMPLATE.render(&context)?,
        body_html: ALERT_HTML_TEMPLATE.render(&context)?,
        recipient: config.receiver_email.clone(),
    })
}

/// SMTP reply codes that mean the credentials were rejected
fn is_auth_code(code: &str) -> bool {
    matches!(code, "530" | "534" | "535")
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Notifier that submits alerts through an authenticated STARTTLS relay.
pub struct SmtpNotifier {
    settings: SmtpSettings,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn transport(
        &self,
        config: &MonitorConfig,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let creds = Credentials::new(config.sender_email.clone(), config.sender_password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.host)
            .map_err(|e| NotifyError::Delivery(format!("failed to create SMTP relay: {}", e)))?
            .port(self.settings.port)
            .credentials(creds)
            .timeout(Some(self.settings.timeout))
            .build();

        Ok(transport)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, matched: &[String], config: &MonitorConfig) -> Result<(), NotifyError> {
        let alert = compose_alert(matched, config, Utc::now())?;
        tracing::info!(
            recipient = %anonymize_email(&alert.recipient),
            "Attempting to send email"
        );

        let from = parse_mailbox(&config.sender_email)?;
        let to = parse_mailbox(&alert.recipient)?;
        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(alert.subject)
            .multipart(MultiPart::alternative_plain_html(
                alert.body_text,
                alert.body_html,
            ))
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport(config)?.send(email).await.map_err(|e| {
            let code = e.status().map(|code| code.to_string());
            match code {
                Some(code) if is_auth_code(&code) => NotifyError::Auth(e.to_string()),
                _ => NotifyError::Delivery(e.to_string()),
            }
        })?;

        tracing::info!("Email sent successfully");
        Ok(())
    }
}
