//! # Email Sending
//!
//! The `EmailSender` seam isolates SMTP from everything that composes
//! mail. Production uses lettre's async SMTP transport; tests use the
//! recording mock.
//!
//! ## Sender Identity
//! The system owns a single SMTP identity (`SmtpConfig::from_email`).
//! Every outbound mail carries the originating company's name as the
//! display part: `"Comercial Andes SpA <no-responder@cotiza.app>"`, with
//! the company's own contact address as reply-to when available.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::info;

use crate::config::SmtpConfig;
use crate::error::{NotifyError, NotifyResult};

// =============================================================================
// Outbound Mail Model
// =============================================================================

/// A binary attachment (in practice: the quote PDF).
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// One outbound email, channel-agnostic.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    /// Display name rendered in front of the system sender address.
    pub from_name: String,

    /// Recipient address.
    pub to: String,

    /// Reply-to address (usually the company contact email).
    pub reply_to: Option<String>,

    pub subject: String,

    /// Plain-text body (promotions, alerts).
    pub body_text: Option<String>,

    /// HTML body (quote emails with the tracking pixel).
    pub body_html: Option<String>,

    /// Optional attachment (quote PDF).
    pub attachment: Option<EmailAttachment>,
}

// =============================================================================
// Sender Trait
// =============================================================================

/// Delivery seam for outbound email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Delivers one email. Errors are transient by taxonomy: callers
    /// either retry on the next pass (batch) or surface them (interactive).
    async fn send(&self, email: &OutboundEmail) -> NotifyResult<()>;
}

// =============================================================================
// SMTP Implementation
// =============================================================================

/// lettre-based SMTP sender (STARTTLS relay).
pub struct SmtpSender {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// Builds the SMTP transport from configuration.
    pub fn new(config: SmtpConfig) -> NotifyResult<Self> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Email(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(SmtpSender { config, transport })
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, email: &OutboundEmail) -> NotifyResult<()> {
        let from_mailbox: Mailbox = format!("{} <{}>", email.from_name, self.config.from_email)
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("from: {}", e)))?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("to: {}", e)))?;

        let mut builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject);

        if let Some(reply_to) = &email.reply_to {
            let reply_mailbox: Mailbox = reply_to
                .parse()
                .map_err(|e| NotifyError::InvalidAddress(format!("reply-to: {}", e)))?;
            builder = builder.reply_to(reply_mailbox);
        }

        // Body part: exactly one of text / html is set by our composers.
        let body_part = match (&email.body_text, &email.body_html) {
            (_, Some(html)) => SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(html.clone()),
            (Some(text), None) => SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(text.clone()),
            (None, None) => {
                return Err(NotifyError::Email(
                    "Email must have a text or HTML body".to_string(),
                ));
            }
        };

        let message = match &email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    NotifyError::Email(format!("Invalid attachment content type: {}", e))
                })?;
                let attachment_part = Attachment::new(attachment.filename.clone())
                    .body(attachment.bytes.clone(), content_type);

                builder
                    .multipart(
                        MultiPart::mixed()
                            .singlepart(body_part)
                            .singlepart(attachment_part),
                    )
                    .map_err(|e| NotifyError::Email(format!("Failed to build message: {}", e)))?
            }
            None => builder
                .singlepart(body_part)
                .map_err(|e| NotifyError::Email(format!("Failed to build message: {}", e)))?,
        };

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Email(format!("Failed to send email: {}", e)))?;

        info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

// =============================================================================
// Mock Implementation
// =============================================================================

/// Recording email sender for tests.
///
/// Captures every outbound email; can be toggled into a failing state to
/// exercise retry behavior.
#[derive(Default)]
pub struct MockEmailSender {
    sent: Mutex<Vec<OutboundEmail>>,
    failing: AtomicBool,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// All emails delivered so far.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mock mutex poisoned").clone()
    }

    /// Number of emails delivered so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("mock mutex poisoned").len()
    }

    /// Makes subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, email: &OutboundEmail) -> NotifyResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Email("mock SMTP failure".to_string()));
        }

        self.sent
            .lock()
            .expect("mock mutex poisoned")
            .push(email.clone());

        info!(to = %email.to, subject = %email.subject, "[MOCK] Email would be sent");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
