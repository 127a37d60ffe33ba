//! # Batch Pass
//!
//! The re-entrant entry point the scheduler invokes: one full pass over
//! stale-quote alerts and loyalty promotions.
//!
//! ## One Pass
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        run_pass(now)                                    │
//! │                                                                         │
//! │  1. Stale-quote alerts (stale::run_stale_quote_pass)                   │
//! │                                                                         │
//! │  2. Loyalty, sequentially:                                             │
//! │     for company in companies_with_loyalty_enabled:                     │
//! │         products = in-stock products     (skip company if none)        │
//! │         for client in company.clients:                                 │
//! │             skip if no email                                           │
//! │             gates = loyalty::evaluate(now, registered, last_promo)     │
//! │             if eligible:                                               │
//! │                 product = picker.pick(products)   (uniform random)     │
//! │                 promo::dispatch(...)    (failure: log + continue)      │
//! │                                                                         │
//! │  No state survives between passes - everything lives in the            │
//! │  repositories, so the function is safe to re-enter on any schedule.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures are isolated per iteration: one client's SMTP error never
//! blocks the rest of the pass, and because history is only appended on
//! success that client is retried naturally next time.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use cotiza_core::loyalty::{evaluate, Eligibility};
use cotiza_db::Database;

use crate::email::EmailSender;
use crate::error::NotifyResult;
use crate::promo;
use crate::selector::ProductPicker;
use crate::stale;

/// Counters for one completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Consolidated stale-quote alerts delivered.
    pub stale_alerts: usize,

    /// Loyalty promotions delivered (and recorded).
    pub promotions_sent: usize,

    /// Dispatch attempts that failed and will be retried next pass.
    pub failures: usize,
}

/// Runs one full pass: stale alerts first, then loyalty.
///
/// `now` is supplied by the caller so the pass stays deterministic and
/// testable; the scheduler passes the wall clock.
pub async fn run_pass(
    db: &Database,
    sender: &dyn EmailSender,
    picker: &dyn ProductPicker,
    now: DateTime<Utc>,
) -> NotifyResult<PassSummary> {
    let mut summary = PassSummary::default();

    // Stale alerts never block the loyalty pass.
    match stale::run_stale_quote_pass(db, sender, now).await {
        Ok(count) => summary.stale_alerts = count,
        Err(e) => {
            error!(error = %e, "Stale-quote pass failed");
            summary.failures += 1;
        }
    }

    let companies = db.companies().list_loyalty_enabled().await?;
    info!(companies = companies.len(), "Starting loyalty pass");

    for company in &companies {
        // Products are fetched once per company per pass.
        let products = db.products().list_in_stock(&company.id).await?;
        if products.is_empty() {
            debug!(company = %company.name, "No in-stock products, skipping company");
            continue;
        }

        let clients = db.clients().list_by_company(&company.id).await?;

        for client in &clients {
            if client.email.is_none() {
                continue;
            }

            let last_promo = db
                .promotions()
                .latest_for(&company.id, &client.id)
                .await?
                .map(|entry| entry.sent_at);

            let outcome = evaluate(now, client.registered_at, last_promo, &company.loyalty);
            if outcome != Eligibility::Eligible {
                debug!(
                    company = %company.name,
                    client = %client.name,
                    ?outcome,
                    "Client not eligible"
                );
                continue;
            }

            // Reselected independently for every eligible client.
            let product = match picker.pick(&products) {
                Some(product) => product,
                None => continue,
            };

            match promo::dispatch(db, sender, company, client, product, now).await {
                Ok(_) => summary.promotions_sent += 1,
                Err(e) => {
                    // Isolated: continue with the next client.
                    warn!(
                        company = %company.name,
                        client = %client.name,
                        error = %e,
                        "Promotion dispatch failed"
                    );
                    summary.failures += 1;
                }
            }
        }
    }

    info!(
        stale_alerts = summary.stale_alerts,
        promotions_sent = summary.promotions_sent,
        failures = summary.failures,
        "Pass complete"
    );

    Ok(summary)
}

// =============================================================================
// Unit Tests
// =============================================================================
