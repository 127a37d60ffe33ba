//! # WhatsApp Quote Delivery
//!
//! Composes the WhatsApp message for a quote and decides the channel:
//! the Business API (when the company configured a supported provider) or
//! the WhatsApp-Web flow where the caller opens a prefilled conversation.
//!
//! The transport itself is an external collaborator - this module only
//! produces the routed payload.

use cotiza_core::money::format_amount;
use cotiza_core::types::{Client, Company, Quote};

use crate::error::{NotifyError, NotifyResult};

/// Providers the Business API route currently understands.
const SUPPORTED_PROVIDERS: [&str; 1] = ["twilio"];

/// Where (and with what) a WhatsApp quote send should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhatsAppRoute {
    /// Deliver through the company's Business API provider.
    Api {
        provider: String,
        from_number: String,
        to_number: String,
        message: String,
    },
    /// Hand the payload back for the WhatsApp-Web flow.
    Web { phone: String, message: String },
}

/// Composes the quote message text.
pub fn compose_quote_message(company: &Company, client: &Client, quote: &Quote) -> String {
    let contact_line = match &company.phone {
        Some(phone) => format!("Contáctenos al: {}", phone),
        None => "Quedamos atentos a sus consultas.".to_string(),
    };

    format!(
        "Hola {client}, soy de {company}.\n\n\
         Le enviamos la cotización #{number}.\n\n\
         Total: {total}\n\n\
         {contact}",
        client = client.name,
        company = company.name,
        number = quote.sequence_number,
        total = format_amount(quote.total, &company.currency),
        contact = contact_line,
    )
}

/// Routes a quote send to the right WhatsApp channel.
///
/// ## Errors
/// - [`NotifyError::MissingRecipient`] when the client has no phone
/// - [`NotifyError::UnsupportedProvider`] when the Business API is enabled
///   with a provider this system doesn't know
pub fn route_quote(company: &Company, client: &Client, quote: &Quote) -> NotifyResult<WhatsAppRoute> {
    let phone = client
        .phone
        .clone()
        .ok_or_else(|| NotifyError::MissingRecipient(format!("client {}", client.id)))?;

    let message = compose_quote_message(company, client, quote);

    if company.whatsapp.enabled {
        if let Some(provider) = &company.whatsapp.provider {
            if !SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
                return Err(NotifyError::UnsupportedProvider(provider.clone()));
            }
            let from_number = company.whatsapp.from_number.clone().ok_or_else(|| {
                NotifyError::MissingRecipient(format!("company {} from_number", company.id))
            })?;

            return Ok(WhatsAppRoute::Api {
                provider: provider.clone(),
                from_number,
                to_number: phone,
                message,
            });
        }
    }

    Ok(WhatsAppRoute::Web { phone, message })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cotiza_core::types::{
        CurrencySettings, LoyaltySettings, QuoteStatus, WhatsAppSettings,
    };
    use rust_decimal::Decimal;

    fn company(whatsapp: WhatsAppSettings) -> Company {
        Company {
            id: "c1".to_string(),
            name: "Comercial Andes".to_string(),
            rut: "76.123.456-K".to_string(),
            email: None,
            phone: Some("+56 2 2345 6789".to_string()),
            address: None,
            currency: CurrencySettings::default(),
            loyalty: LoyaltySettings::default(),
            whatsapp,
            created_at: Utc::now(),
        }
    }

    fn client(phone: Option<&str>) -> Client {
        Client {
            id: "cl1".to_string(),
            company_id: "c1".to_string(),
            name: "Ana Soto".to_string(),
            email: None,
            phone: phone.map(str::to_string),
            rut: None,
            registered_at: Some(Utc::now()),
        }
    }

    fn quote() -> Quote {
        Quote {
            id: "q1".to_string(),
            company_id: "c1".to_string(),
            client_id: "cl1".to_string(),
            worker_id: None,
            sequence_number: 7,
            status: QuoteStatus::Draft,
            total: Decimal::new(119000, 0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_message_contains_quote_number_and_total() {
        let message = compose_quote_message(
            &company(WhatsAppSettings::default()),
            &client(Some("+56 9 1111 2222")),
            &quote(),
        );
        assert!(message.contains("cotización #7"));
        assert!(message.contains("$ 119.000"));
        assert!(message.contains("Contáctenos al: +56 2 2345 6789"));
    }

    #[test]
    fn test_web_route_when_api_disabled() {
        let route = route_quote(
            &company(WhatsAppSettings::default()),
            &client(Some("+56 9 1111 2222")),
            &quote(),
        )
        .unwrap();
        assert!(matches!(route, WhatsAppRoute::Web { .. }));
    }

    #[test]
    fn test_api_route_with_twilio() {
        let settings = WhatsAppSettings {
            enabled: true,
            provider: Some("twilio".to_string()),
            from_number: Some("+56 9 0000 0000".to_string()),
        };
        let route = route_quote(&company(settings), &client(Some("+56 9 1111 2222")), &quote())
            .unwrap();
        match route {
            WhatsAppRoute::Api {
                provider,
                from_number,
                to_number,
                ..
            } => {
                assert_eq!(provider, "twilio");
                assert_eq!(from_number, "+56 9 0000 0000");
                assert_eq!(to_number, "+56 9 1111 2222");
            }
            other => panic!("expected Api route, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let settings = WhatsAppSettings {
            enabled: true,
            provider: Some("acme-msg".to_string()),
            from_number: Some("+56 9 0000 0000".to_string()),
        };
        let err = route_quote(&company(settings), &client(Some("+56 9 1111 2222")), &quote())
            .unwrap_err();
        assert!(matches!(err, NotifyError::UnsupportedProvider(_)));
    }

    #[test]
    fn test_missing_phone_is_rejected() {
        let err = route_quote(&company(WhatsAppSettings::default()), &client(None), &quote())
            .unwrap_err();
        assert!(matches!(err, NotifyError::MissingRecipient(_)));
    }
}
