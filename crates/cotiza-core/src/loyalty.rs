//! # Loyalty Eligibility Engine
//!
//! Decides, per client, whether a promotional email may be sent now.
//!
//! ## Gates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Eligibility Evaluation                              │
//! │                                                                         │
//! │  loyalty disabled? ───────────────► Disabled                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  registered_at missing? ──────────► MissingRegistration (skip, no err)  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  GATE 1: now − registered_at < start_delay? ──► InStartDelay            │
//! │        │   (boundary INCLUSIVE: elapsed == delay passes)                │
//! │        ▼                                                                │
//! │  GATE 2: now − last_promo < frequency? ───────► CoolingDown             │
//! │        │   (no history ⇒ gate passes; boundary INCLUSIVE)               │
//! │        ▼                                                                │
//! │     Eligible ──► dispatch a promotion                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Company-level preconditions (client has an email, the company has
//! in-stock products) are checked by the pass runner before this function
//! is consulted; this module is a pure function of timestamps and settings.

use chrono::{DateTime, Utc};

use crate::types::LoyaltySettings;

// =============================================================================
// Eligibility
// =============================================================================

/// The outcome of one eligibility evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Both time gates passed: send a promotion now.
    Eligible,
    /// Loyalty is switched off for the company.
    Disabled,
    /// The client has no registration timestamp. Should not occur under
    /// normal creation; treated as a silent skip, never an error.
    MissingRegistration,
    /// The client registered too recently (Gate 1).
    InStartDelay,
    /// The last promotion is too recent (Gate 2).
    CoolingDown,
}

impl Eligibility {
    /// True only for [`Eligibility::Eligible`].
    #[inline]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Evaluates the loyalty gates for one client at one instant.
///
/// Pure function: the caller supplies `now`, the client's registration
/// timestamp, and the `sent_at` of the most recent promotion history entry
/// for this (company, client) pair, if any.
///
/// ## Boundary Semantics
/// Both windows are inclusive: a client registered *exactly*
/// `start_delay_secs` ago is eligible, and a promotion sent *exactly*
/// `frequency_secs` ago no longer blocks.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use cotiza_core::loyalty::{evaluate, Eligibility};
/// use cotiza_core::types::LoyaltySettings;
///
/// let settings = LoyaltySettings {
///     enabled: true,
///     start_delay_secs: 60,
///     frequency_secs: 300,
///     ..LoyaltySettings::default()
/// };
///
/// let now = Utc::now();
/// let registered = Some(now - Duration::seconds(60));
/// assert_eq!(evaluate(now, registered, None, &settings), Eligibility::Eligible);
/// ```
pub fn evaluate(
    now: DateTime<Utc>,
    registered_at: Option<DateTime<Utc>>,
    last_promo_sent_at: Option<DateTime<Utc>>,
    settings: &LoyaltySettings,
) -> Eligibility {
    if !settings.enabled {
        return Eligibility::Disabled;
    }

    let registered_at = match registered_at {
        Some(ts) => ts,
        None => return Eligibility::MissingRegistration,
    };

    // Gate 1: onboarding delay since registration
    let elapsed_since_registration = (now - registered_at).num_seconds();
    if elapsed_since_registration < settings.start_delay_secs {
        return Eligibility::InStartDelay;
    }

    // Gate 2: cooldown since the most recent promotion
    if let Some(sent_at) = last_promo_sent_at {
        let elapsed_since_promo = (now - sent_at).num_seconds();
        if elapsed_since_promo < settings.frequency_secs {
            return Eligibility::CoolingDown;
        }
    }

    Eligibility::Eligible
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn settings(start_delay_secs: i64, frequency_secs: i64) -> LoyaltySettings {
        LoyaltySettings {
            enabled: true,
            start_delay_secs,
            frequency_secs,
            ..LoyaltySettings::default()
        }
    }

    #[test]
    fn test_disabled_short_circuits() {
        let mut s = settings(0, 0);
        s.enabled = false;
        let now = Utc::now();
        assert_eq!(
            evaluate(now, Some(now - Duration::days(365)), None, &s),
            Eligibility::Disabled
        );
    }

    #[test]
    fn test_missing_registration_skips_without_error() {
        let now = Utc::now();
        assert_eq!(
            evaluate(now, None, None, &settings(0, 0)),
            Eligibility::MissingRegistration
        );
    }

    #[test]
    fn test_start_delay_boundary_is_inclusive() {
        let s = settings(600, 3600);
        let now = Utc::now();

        // Registered exactly start_delay ago: eligible
        let at_boundary = Some(now - Duration::seconds(600));
        assert_eq!(evaluate(now, at_boundary, None, &s), Eligibility::Eligible);

        // One second short: still in the delay window
        let one_short = Some(now - Duration::seconds(599));
        assert_eq!(evaluate(now, one_short, None, &s), Eligibility::InStartDelay);
    }

    #[test]
    fn test_cooldown_boundary_is_inclusive() {
        let s = settings(0, 3600);
        let now = Utc::now();
        let registered = Some(now - Duration::days(30));

        // Sent exactly frequency ago: eligible again
        let at_boundary = Some(now - Duration::seconds(3600));
        assert_eq!(
            evaluate(now, registered, at_boundary, &s),
            Eligibility::Eligible
        );

        // One second short: cooldown still active
        let one_short = Some(now - Duration::seconds(3599));
        assert_eq!(
            evaluate(now, registered, one_short, &s),
            Eligibility::CoolingDown
        );
    }

    #[test]
    fn test_no_history_passes_cooldown() {
        let s = settings(60, 3600);
        let now = Utc::now();
        let registered = Some(now - Duration::seconds(61));
        assert_eq!(evaluate(now, registered, None, &s), Eligibility::Eligible);
    }

    #[test]
    fn test_start_delay_checked_before_cooldown() {
        let s = settings(600, 10);
        let now = Utc::now();
        // Registered just now, old promo on record: start delay wins
        let outcome = evaluate(
            now,
            Some(now),
            Some(now - Duration::days(1)),
            &s,
        );
        assert_eq!(outcome, Eligibility::InStartDelay);
    }
}
