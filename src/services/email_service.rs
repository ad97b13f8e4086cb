use crate::errors::AppError;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::env;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("SMTP_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                == "true",
            host: env::var("SMTP_HOST").unwrap_or_default(),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("SMTP_FROM_EMAIL").unwrap_or_default(),
            from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "FINANCEPR".to_string()),
        }
    }
}

/// Sends an HTML email over SMTP. With SMTP disabled the message is logged
/// instead of sent, so local runs do not need mail credentials.
pub async fn send_html_email(
    config: &SmtpConfig,
    to_email: &str,
    subject: &str,
    html_body: String,
) -> Result<(), AppError> {
    if !config.enabled {
        info!("📧 SMTP disabled, would send '{}' to {}", subject, to_email);
        return Ok(());
    }

    let from_address = format!("{} <{}>", config.from_name, config.from_email)
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid from address: {}", e)))?;
    let to_address = to_email
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid recipient address: {}", e)))?;

    let email = Message::builder()
        .from(from_address)
        .to(to_address)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html_body)
        .map_err(|e| AppError::External(format!("Failed to build email: {}", e)))?;

    let credentials = Credentials::new(config.username.clone(), config.password.clone());
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        .map_err(|e| AppError::External(format!("Failed to create SMTP transport: {}", e)))?
        .port(config.port)
        .credentials(credentials)
        .build();

    mailer
        .send(email)
        .await
        .map_err(|e| AppError::External(format!("SMTP send failed: {}", e)))?;

    info!("✅ Email '{}' sent to {}", subject, to_email);
    Ok(())
}
