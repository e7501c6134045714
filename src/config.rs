use anyhow::Context;
use secrecy::SecretString;

/// Session tokens live at most one day.
pub const MAX_TTL_MINUTES: i64 = 60 * 24;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from: String,
    /// `None` means outgoing mail is only logged.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: SecretString::from(
                std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "accounts".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "accounts-users".into()),
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref()),
        };

        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: std::env::var("SMTP_PORT")
                    .ok()
                    .and_then(|v| v.parse::<u16>().ok())
                    .unwrap_or(587),
                username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
                password: SecretString::from(std::env::var("SMTP_PASSWORD").unwrap_or_default()),
            }),
            Err(_) => None,
        };
        let mail = MailConfig {
            from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Accounts <no-reply@localhost>".into()),
            smtp,
        };

        Ok(Self {
            database_url,
            jwt,
            mail,
        })
    }
}

/// Unset or unparsable falls back to the maximum; anything else is clamped
/// to `1..=MAX_TTL_MINUTES`.
fn parse_ttl_minutes(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|m| m.clamp(1, MAX_TTL_MINUTES))
        .unwrap_or(MAX_TTL_MINUTES)
}
