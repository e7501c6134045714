//! Outgoing account emails.
//!
//! Flows build an [`Email`] from one of the templates below and hand it to
//! [`dispatch`], which runs delivery on a detached task. Nothing is awaited
//! by the caller: a failed delivery is logged and otherwise invisible.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use secrecy::ExposeSecret;
use tracing::{error, info};

use crate::config::{MailConfig, SmtpConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> anyhow::Result<()>;
}

/// Dev sender: logs recipient and subject, never the body (it holds a code).
#[derive(Clone, Debug)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        info!(to = %email.to, subject = %email.subject, "email send stub");
        Ok(())
    }
}

#[derive(Clone)]
pub struct SmtpNotifier {
    from: String,
    mailer: SmtpTransport,
}

impl SmtpNotifier {
    pub fn new(from: &str, smtp: &SmtpConfig) -> anyhow::Result<Self> {
        let mailer = SmtpTransport::starttls_relay(&smtp.host)
            .with_context(|| format!("smtp relay {}", smtp.host))?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.expose_secret().to_string(),
            ))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();
        Ok(Self {
            from: from.to_string(),
            mailer,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse().context("invalid from address")?)
            .to(email.to.parse().context("invalid to address")?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .context("build email")?;

        let mailer = self.mailer.clone();
        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .context("smtp task failed")?
            .context("smtp send")?;
        Ok(())
    }
}

/// Picks SMTP when a host is configured, the logging stub otherwise.
pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    Ok(match &cfg.smtp {
        Some(smtp) => Arc::new(SmtpNotifier::new(&cfg.from, smtp)?),
        None => Arc::new(LogNotifier),
    })
}

/// Fire-and-forget delivery.
pub fn dispatch(notifier: Arc<dyn Notifier>, email: Email) {
    tokio::spawn(async move {
        match notifier.send(&email).await {
            Ok(()) => info!(to = %email.to, subject = %email.subject, "email sent"),
            Err(e) => error!(to = %email.to, error = %e, "email delivery failed"),
        }
    });
}

fn link(base_url: &str, path: &str, code: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), path, code)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// `first_name` is user input; the rest is ours.
fn layout(first_name: &str, text: &str, href: &str, button: &str) -> String {
    format!(
        r#"<div style="max-width: 500px; margin: 50px auto; padding: 30px; font-family: Arial, sans-serif;">
  <h1 style="text-align: center;">Hello {name}!</h1>
  <p style="text-align: center;">{text}</p>
  <div style="text-align: center;">
    <a href="{href}" style="display: inline-block; padding: 14px 28px; text-decoration: none; font-weight: bold;">{button}</a>
  </div>
</div>"#,
        name = escape_html(&first_name.to_uppercase()),
    )
}

pub fn verify_account_email(to: &str, first_name: &str, base_url: &str, code: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Verify your account".into(),
        html: layout(
            first_name,
            "Thanks for signing up. Click the link below to verify your account:",
            &link(base_url, "verify_email", code),
            "Verify account",
        ),
    }
}

pub fn reset_password_email(to: &str, first_name: &str, base_url: &str, code: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Reset your password".into(),
        html: layout(
            first_name,
            "We received a request to reset your password. Click the link below to choose a new one:",
            &link(base_url, "reset_password", code),
            "Reset password",
        ),
    }
}
