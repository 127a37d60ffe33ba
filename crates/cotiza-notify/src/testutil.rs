//! Test fixtures shared by this crate's test modules.

use chrono::Utc;
use rust_decimal::Decimal;

use cotiza_core::types::{
    Client, Company, CurrencySettings, LoyaltySettings, Product, WhatsAppSettings,
};
use cotiza_db::{Database, DbConfig};

/// Fresh in-memory database with migrations applied.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// A company fixture; loyalty off, contact email set.
pub fn company(id: &str, name: &str) -> Company {
    Company {
        id: id.to_string(),
        name: name.to_string(),
        rut: format!("76.000.{}-K", id),
        email: Some(format!("contacto@{}.cl", id)),
        phone: Some("+56 2 2345 6789".to_string()),
        address: None,
        currency: CurrencySettings::default(),
        loyalty: LoyaltySettings::default(),
        whatsapp: WhatsAppSettings::default(),
        created_at: Utc::now(),
    }
}

/// A client fixture registered right now.
pub fn client(id: &str, company_id: &str) -> Client {
    Client {
        id: id.to_string(),
        company_id: company_id.to_string(),
        name: format!("Cliente {}", id),
        email: Some(format!("cliente-{}@correo.cl", id)),
        phone: Some("+56 9 8765 4321".to_string()),
        rut: None,
        registered_at: Some(Utc::now()),
    }
}

/// A product fixture without additional taxes.
pub fn product(id: &str, company_id: &str, net_price: Decimal, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        company_id: company_id.to_string(),
        name: format!("Producto {}", id),
        description: None,
        sku: Some(format!("SKU-{}", id)),
        net_price,
        primary_tax_rate: Decimal::new(19, 0),
        legacy_fixed_tax: Decimal::ZERO,
        primary_additional_tax: None,
        additional_taxes: Vec::new(),
        stock,
        created_at: Utc::now(),
    }
}
