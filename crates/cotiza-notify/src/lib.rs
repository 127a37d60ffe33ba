//! # cotiza-notify: Outbound Channels & Scheduled Passes
//!
//! Everything that leaves Cotiza goes through this crate:
//!
//! - [`email`] - the `EmailSender` trait, SMTP implementation (lettre) and
//!   a recording mock for tests
//! - [`quote_mail`] - quote email composition (HTML + tracking pixel + PDF
//!   attachment)
//! - [`whatsapp`] - WhatsApp payload composition and channel routing
//! - [`promo`] - loyalty promotion dispatch (offer math + message + history)
//! - [`stale`] - consolidated stale-quote alerts per company
//! - [`pass`] - the re-entrant `run_pass(now)` batch entry point
//! - [`scheduler`] - the periodic loop invoking passes
//! - [`selector`] - injectable product picker (random in production,
//!   deterministic in tests)
//! - [`config`] - environment configuration
//!
//! ## Failure Philosophy
//! A delivery failure is never fatal to a pass: the failing iteration is
//! logged and skipped, and - because promotion history is only written on
//! success - the client is retried naturally on the next pass. Interactive
//! sends (quote email) surface their error to the caller instead.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod email;
pub mod error;
pub mod pass;
pub mod promo;
pub mod quote_mail;
pub mod scheduler;
pub mod selector;
pub mod stale;
pub mod whatsapp;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, NotifyConfig, SmtpConfig};
pub use email::{EmailSender, MockEmailSender, OutboundEmail, SmtpSender};
pub use error::{NotifyError, NotifyResult};
pub use pass::{run_pass, PassSummary};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use selector::{FixedPicker, ProductPicker, RandomPicker};
