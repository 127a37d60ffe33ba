//! # Notification Configuration
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. Only the SMTP credentials are required for real deliveries;
//! everything else has a sensible development default.

use std::env;

/// SMTP transport configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP relay host (STARTTLS).
    pub host: String,

    /// SMTP relay port.
    pub port: u16,

    /// SMTP username.
    pub user: String,

    /// SMTP password.
    pub password: String,

    /// System sender address. Outbound mail renders as
    /// `"{Company Name} <from_email>"`.
    pub from_email: String,
}

/// Top-level configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Seconds between scheduler passes.
    pub pass_interval_secs: u64,

    /// SMTP transport settings.
    pub smtp: SmtpConfig,
}

impl NotifyConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = NotifyConfig {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "cotiza.db".to_string()),

            pass_interval_secs: env::var("PASS_INTERVAL_SECS")
                .unwrap_or_else(|_| "21600".to_string()) // 6 hours
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PASS_INTERVAL_SECS".to_string()))?,

            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),

                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("SMTP_PORT".to_string()))?,

                user: env::var("SMTP_USER").unwrap_or_default(),

                password: env::var("SMTP_PASSWORD").unwrap_or_default(),

                from_email: env::var("SMTP_FROM_EMAIL")
                    .unwrap_or_else(|_| "no-responder@cotiza.app".to_string()),
            },
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
