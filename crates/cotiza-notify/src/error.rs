//! # Notification Error Types
//!
//! Errors for outbound delivery and batch passes.

use cotiza_db::DbError;
use thiserror::Error;

/// Outbound / pass errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// The SMTP collaborator rejected or failed the send.
    ///
    /// Transient by taxonomy: loyalty sends are retried on the next pass,
    /// interactive sends surface this to the caller.
    #[error("Email delivery failed: {0}")]
    Email(String),

    /// The recipient has no usable address for the requested channel.
    #[error("Recipient missing: {0}")]
    MissingRecipient(String),

    /// An address could not be parsed into a mailbox.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The company's WhatsApp provider is not supported.
    #[error("WhatsApp provider not supported: {0}")]
    UnsupportedProvider(String),

    /// An internal control channel closed unexpectedly.
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;
