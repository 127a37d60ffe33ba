//! # Quote Email
//!
//! Composition and interactive sending of a quote to its client: HTML body
//! with an embedded open-tracking pixel, the rendered PDF attached, sender
//! identity `"{Company} <system-address>"`, reply-to the company contact.
//!
//! ## Open Tracking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Open Tracking Flow                                 │
//! │                                                                         │
//! │  send_quote_email()                                                    │
//! │     │  body embeds <img src="{tracking_url}" width=1 height=1>         │
//! │     ▼                                                                   │
//! │  client opens the mail ──► GET tracking_url (HTTP layer, external)     │
//! │     │                        responds with TRACKING_PIXEL_GIF          │
//! │     ▼                                                                   │
//! │  QuoteRepository::mark_opened() ──► Sent → Opened                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors here are request-level: the interactive caller gets them and can
//! retry; nothing is swallowed (unlike the batch passes).

use tracing::info;

use cotiza_core::money::format_amount;
use cotiza_core::types::{Client, Company, Quote};
use cotiza_db::Database;

use crate::email::{EmailAttachment, EmailSender, OutboundEmail};
use crate::error::{NotifyError, NotifyResult};

// =============================================================================
// Constants
// =============================================================================

/// 1×1 transparent GIF served by the tracking endpoint.
pub const TRACKING_PIXEL_GIF: [u8; 35] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xff, 0xff,
    0xff, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02,
    0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Content type of the tracking pixel response.
pub const TRACKING_PIXEL_CONTENT_TYPE: &str = "image/gif";

// =============================================================================
// Composition
// =============================================================================

/// Composes the quote email for a client.
///
/// ## Arguments
/// * `pdf_bytes` - the rendered quote document (PDF collaborator output)
/// * `tracking_url` - absolute URL of the open-tracking pixel endpoint for
///   this quote (the HTTP layer owns URL construction)
pub fn compose_quote_email(
    company: &Company,
    client: &Client,
    quote: &Quote,
    pdf_bytes: Vec<u8>,
    tracking_url: &str,
) -> NotifyResult<OutboundEmail> {
    let to = client
        .email
        .clone()
        .ok_or_else(|| NotifyError::MissingRecipient(format!("client {}", client.id)))?;

    let subject = format!(
        "Cotización #{} - {}",
        quote.sequence_number, company.name
    );

    let contact_email = company.email.clone().unwrap_or_default();

    let body_html = format!(
        r#"<html>
<body>
    <p>Estimado/a {client},</p>
    <p>Adjunto encontrará la cotización #{number} solicitada.</p>
    <p><strong>Detalles:</strong></p>
    <ul>
        <li>Fecha: {date}</li>
        <li>Total: {total}</li>
    </ul>
    <p>Quedamos atentos a cualquier consulta.</p>
    <br>
    <p>Saludos cordiales,</p>
    <p><strong>{company}</strong></p>
    <p>{phone}</p>
    <p>Contáctanos: <a href="mailto:{contact}">{contact}</a></p>

    <img src="{tracking_url}" width="1" height="1" style="display:none;" alt="" />
</body>
</html>
"#,
        client = client.name,
        number = quote.sequence_number,
        date = quote.created_at.format("%d/%m/%Y"),
        total = format_amount(quote.total, &company.currency),
        company = company.name,
        phone = company.phone.as_deref().unwrap_or(""),
        contact = contact_email,
        tracking_url = tracking_url,
    );

    Ok(OutboundEmail {
        from_name: company.name.clone(),
        to,
        reply_to: company.email.clone(),
        subject,
        body_text: None,
        body_html: Some(body_html),
        attachment: Some(EmailAttachment {
            filename: format!("cotizacion_{}.pdf", quote.sequence_number),
            content_type: "application/pdf".to_string(),
            bytes: pdf_bytes,
        }),
    })
}

// =============================================================================
// Sending
// =============================================================================

/// Sends a quote to its client and advances Draft → Sent.
///
/// The status only advances after a successful delivery; a quote that was
/// already sent keeps its status (re-sends are allowed).
pub async fn send_quote_email(
    db: &Database,
    sender: &dyn EmailSender,
    company: &Company,
    client: &Client,
    quote: &Quote,
    pdf_bytes: Vec<u8>,
    tracking_url: &str,
) -> NotifyResult<()> {
    let email = compose_quote_email(company, client, quote, pdf_bytes, tracking_url)?;

    sender.send(&email).await?;

    let transitioned = db.quotes().mark_sent(&quote.id).await?;
    info!(
        quote = quote.sequence_number,
        company = %company.name,
        to = %email.to,
        transitioned,
        "Quote email sent"
    );

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::MockEmailSender;
    use crate::testutil::{client, company, test_db};
    use cotiza_core::types::QuoteStatus;
    use cotiza_db::NewQuoteLine;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pixel_is_a_gif_header() {
        assert_eq!(&TRACKING_PIXEL_GIF[0..6], b"GIF89a");
        assert_eq!(TRACKING_PIXEL_GIF[34], 0x3b); // trailer
    }

    #[tokio::test]
    async fn test_send_quote_email_attaches_pdf_and_marks_sent() {
        let db = test_db().await;
        let company = company("c1", "Comercial Andes");
        db.companies().insert(&company).await.unwrap();
        let client = client("cl1", "c1");
        db.clients().insert(&client).await.unwrap();

        let lines = vec![NewQuoteLine {
            product_id: None,
            quantity: 1,
            unit_net_price: dec!(1000),
            discount_percent: dec!(0),
        }];
        let quote = db.quotes().create("c1", "cl1", None, &lines).await.unwrap();

        let mock = MockEmailSender::new();
        send_quote_email(
            &db,
            &mock,
            &company,
            &client,
            &quote,
            b"%PDF-1.4 fake".to_vec(),
            "https://cotiza.app/api/cotizaciones/1/track/",
        )
        .await
        .unwrap();

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Cotización #1 - Comercial Andes");
        assert_eq!(sent[0].from_name, "Comercial Andes");
        assert_eq!(sent[0].reply_to, company.email);

        let html = sent[0].body_html.as_ref().unwrap();
        assert!(html.contains("cotizaciones/1/track/"));
        assert!(html.contains("Estimado/a Cliente cl1"));

        let attachment = sent[0].attachment.as_ref().unwrap();
        assert_eq!(attachment.filename, "cotizacion_1.pdf");
        assert_eq!(attachment.content_type, "application/pdf");

        let loaded = db.quotes().get_by_id(&quote.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, QuoteStatus::Sent);
    }

    #[tokio::test]
    async fn test_send_failure_leaves_status_draft() {
        let db = test_db().await;
        let company = company("c1", "Comercial Andes");
        db.companies().insert(&company).await.unwrap();
        let client = client("cl1", "c1");
        db.clients().insert(&client).await.unwrap();

        let lines = vec![NewQuoteLine {
            product_id: None,
            quantity: 1,
            unit_net_price: dec!(1000),
            discount_percent: dec!(0),
        }];
        let quote = db.quotes().create("c1", "cl1", None, &lines).await.unwrap();

        let mock = MockEmailSender::new();
        mock.set_failing(true);

        let err = send_quote_email(
            &db,
            &mock,
            &company,
            &client,
            &quote,
            Vec::new(),
            "https://cotiza.app/track",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, NotifyError::Email(_)));

        let loaded = db.quotes().get_by_id(&quote.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, QuoteStatus::Draft);
    }

    #[tokio::test]
    async fn test_client_without_email_is_rejected() {
        let db = test_db().await;
        let company = company("c1", "Comercial Andes");
        db.companies().insert(&company).await.unwrap();
        let mut quiet = client("cl1", "c1");
        quiet.email = None;
        db.clients().insert(&quiet).await.unwrap();

        let lines = vec![NewQuoteLine {
            product_id: None,
            quantity: 1,
            unit_net_price: dec!(1000),
            discount_percent: dec!(0),
        }];
        let quote = db.quotes().create("c1", "cl1", None, &lines).await.unwrap();

        let mock = MockEmailSender::new();
        let err = send_quote_email(&db, &mock, &company, &quiet, &quote, Vec::new(), "url")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::MissingRecipient(_)));
        assert_eq!(mock.sent_count(), 0);
    }
}
