//! # Stale Quote Alerts
//!
//! Quotes that were sent and never answered go stale after a few days.
//! Each pass groups them per company and emails ONE consolidated alert to
//! the company's contact address.
//!
//! A company without a contact email is skipped with a warning; a send
//! failure for one company never aborts the others.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use cotiza_core::money::format_amount;
use cotiza_core::types::{Company, Quote};
use cotiza_db::Database;

use crate::email::{EmailSender, OutboundEmail};
use crate::error::NotifyResult;

/// Days a Sent quote may wait before it counts as stale.
pub const STALE_AFTER_DAYS: i64 = 3;

/// Display name on alert emails (the platform, not a tenant).
const ALERT_SENDER_NAME: &str = "Cotiza";

/// Runs the stale-quote alert pass.
///
/// Returns the number of alert emails successfully sent.
pub async fn run_stale_quote_pass(
    db: &Database,
    sender: &dyn EmailSender,
    now: DateTime<Utc>,
) -> NotifyResult<usize> {
    let cutoff = now - Duration::days(STALE_AFTER_DAYS);
    let stale = db.quotes().list_stale_sent(cutoff).await?;

    if stale.is_empty() {
        info!("No stale quotes found");
        return Ok(0);
    }

    // Group by company; BTreeMap keeps pass output deterministic.
    let mut by_company: BTreeMap<String, Vec<Quote>> = BTreeMap::new();
    for quote in stale {
        by_company.entry(quote.company_id.clone()).or_default().push(quote);
    }

    let mut alerts_sent = 0;
    for (company_id, quotes) in by_company {
        let company = match db.companies().get_by_id(&company_id).await? {
            Some(company) => company,
            None => continue,
        };

        info!(
            company = %company.name,
            stale = quotes.len(),
            "Processing company with stale quotes"
        );

        let email = match compose_alert(db, &company, &quotes).await {
            Ok(Some(email)) => email,
            Ok(None) => {
                warn!(company = %company.name, "Company has no contact email, skipping alert");
                continue;
            }
            Err(e) => {
                warn!(company = %company.name, error = %e, "Failed to compose stale alert");
                continue;
            }
        };

        match sender.send(&email).await {
            Ok(()) => {
                info!(to = %email.to, "Stale-quote alert sent");
                alerts_sent += 1;
            }
            Err(e) => {
                // Isolated failure: the next company still gets its alert.
                warn!(company = %company.name, error = %e, "Failed to send stale alert");
            }
        }
    }

    Ok(alerts_sent)
}

/// Composes the consolidated alert for one company.
///
/// Returns `Ok(None)` when the company has no contact email.
async fn compose_alert(
    db: &Database,
    company: &Company,
    quotes: &[Quote],
) -> NotifyResult<Option<OutboundEmail>> {
    let to = match &company.email {
        Some(email) => email.clone(),
        None => return Ok(None),
    };

    let subject = format!(
        "Alerta - {} Cotizaciones sin respuesta - {}",
        quotes.len(),
        company.name
    );

    let mut body = format!(
        "Hola {},\n\n\
         El sistema ha detectado {} cotizaciones enviadas hace más de {} días \
         que aún no tienen respuesta (estado 'Enviada').\n\n\
         Listado:\n",
        company.name,
        quotes.len(),
        STALE_AFTER_DAYS
    );

    for quote in quotes {
        let client_name = match db.clients().get_by_id(&quote.client_id).await? {
            Some(client) => client.name,
            None => "Cliente eliminado".to_string(),
        };
        body.push_str(&format!(
            "- #{} Cliente: {} ({}) - Fecha: {}\n",
            quote.sequence_number,
            client_name,
            format_amount(quote.total, &company.currency),
            quote.created_at.format("%d/%m/%Y"),
        ));
    }

    body.push_str("\nSe recomienda contactar a los clientes.\n\nSaludos,\nCotiza\n");

    Ok(Some(OutboundEmail {
        from_name: ALERT_SENDER_NAME.to_string(),
        to,
        reply_to: None,
        subject,
        body_text: Some(body),
        body_html: None,
        attachment: None,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================
