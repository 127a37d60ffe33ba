//! # Company Repository
//!
//! Database operations for companies (tenants) and their loyalty /
//! currency / WhatsApp configuration.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use cotiza_core::types::{Company, CurrencySettings, LoyaltySettings, WhatsAppSettings};

use crate::error::DbResult;
use crate::repository::parse_decimal;

/// Repository for company database operations.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

/// Raw companies row; decimal TEXT columns parsed in `TryFrom`.
#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: String,
    name: String,
    rut: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    currency_symbol: String,
    currency_code: String,
    currency_decimals: i64,
    loyalty_enabled: bool,
    loyalty_start_delay_secs: i64,
    loyalty_frequency_secs: i64,
    loyalty_discount_percent: String,
    loyalty_message: String,
    whatsapp_enabled: bool,
    whatsapp_provider: Option<String>,
    whatsapp_from_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = crate::error::DbError;

    fn try_from(row: CompanyRow) -> DbResult<Company> {
        Ok(Company {
            id: row.id,
            name: row.name,
            rut: row.rut,
            email: row.email,
            phone: row.phone,
            address: row.address,
            currency: CurrencySettings {
                symbol: row.currency_symbol,
                code: row.currency_code,
                decimals: row.currency_decimals.max(0) as u32,
            },
            loyalty: LoyaltySettings {
                enabled: row.loyalty_enabled,
                start_delay_secs: row.loyalty_start_delay_secs,
                frequency_secs: row.loyalty_frequency_secs,
                discount_percent: parse_decimal(
                    "loyalty_discount_percent",
                    &row.loyalty_discount_percent,
                )?,
                message_template: row.loyalty_message,
            },
            whatsapp: WhatsAppSettings {
                enabled: row.whatsapp_enabled,
                provider: row.whatsapp_provider,
                from_number: row.whatsapp_from_number,
            },
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    id, name, rut, email, phone, address,
    currency_symbol, currency_code, currency_decimals,
    loyalty_enabled, loyalty_start_delay_secs, loyalty_frequency_secs,
    loyalty_discount_percent, loyalty_message,
    whatsapp_enabled, whatsapp_provider, whatsapp_from_number,
    created_at
"#;

impl CompanyRepository {
    /// Creates a new CompanyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    /// Inserts a company.
    ///
    /// `next_quote_seq` starts at 0; the quote repository owns it afterwards.
    pub async fn insert(&self, company: &Company) -> DbResult<()> {
        debug!(id = %company.id, name = %company.name, "Inserting company");

        sqlx::query(
            r#"
            INSERT INTO companies (
                id, name, rut, email, phone, address,
                currency_symbol, currency_code, currency_decimals,
                loyalty_enabled, loyalty_start_delay_secs, loyalty_frequency_secs,
                loyalty_discount_percent, loyalty_message,
                whatsapp_enabled, whatsapp_provider, whatsapp_from_number,
                next_quote_seq, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, 0, ?18)
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.rut)
        .bind(&company.email)
        .bind(&company.phone)
        .bind(&company.address)
        .bind(&company.currency.symbol)
        .bind(&company.currency.code)
        .bind(company.currency.decimals as i64)
        .bind(company.loyalty.enabled)
        .bind(company.loyalty.start_delay_secs)
        .bind(company.loyalty.frequency_secs)
        .bind(company.loyalty.discount_percent.to_string())
        .bind(&company.loyalty.message_template)
        .bind(company.whatsapp.enabled)
        .bind(&company.whatsapp.provider)
        .bind(&company.whatsapp.from_number)
        .bind(company.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a company by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Company>> {
        let row: Option<CompanyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM companies WHERE id = ?1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Company::try_from).transpose()
    }

    /// Lists companies with the loyalty system switched on.
    ///
    /// This is the entry query of every loyalty pass.
    pub async fn list_loyalty_enabled(&self) -> DbResult<Vec<Company>> {
        let rows: Vec<CompanyRow> = sqlx::query_as(&format!(
            "SELECT {} FROM companies WHERE loyalty_enabled = 1 ORDER BY id",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Company::try_from).collect()
    }

    /// Updates a company's loyalty configuration (administrative edit).
    pub async fn update_loyalty_settings(
        &self,
        company_id: &str,
        loyalty: &LoyaltySettings,
    ) -> DbResult<()> {
        debug!(id = %company_id, enabled = loyalty.enabled, "Updating loyalty settings");

        let result = sqlx::query(
            r#"
            UPDATE companies SET
                loyalty_enabled = ?2,
                loyalty_start_delay_secs = ?3,
                loyalty_frequency_secs = ?4,
                loyalty_discount_percent = ?5,
                loyalty_message = ?6
            WHERE id = ?1
            "#,
        )
        .bind(company_id)
        .bind(loyalty.enabled)
        .bind(loyalty.start_delay_secs)
        .bind(loyalty.frequency_secs)
        .bind(loyalty.discount_percent.to_string())
        .bind(&loyalty.message_template)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::DbError::not_found("Company", company_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{company, test_db};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let db = test_db().await;
        let repo = db.companies();

        let mut expected = company("c1", "Comercial Andes SpA");
        expected.loyalty.enabled = true;
        expected.loyalty.discount_percent = dec!(7.5);
        repo.insert(&expected).await.unwrap();

        let loaded = repo.get_by_id("c1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Comercial Andes SpA");
        assert_eq!(loaded.currency.code, "CLP");
        assert!(loaded.loyalty.enabled);
        assert_eq!(loaded.loyalty.discount_percent, dec!(7.5));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = test_db().await;
        assert!(db.companies().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_loyalty_enabled_filters() {
        let db = test_db().await;
        let repo = db.companies();

        let mut on = company("c-on", "Con Fidelización");
        on.loyalty.enabled = true;
        let off = company("c-off", "Sin Fidelización");

        repo.insert(&on).await.unwrap();
        repo.insert(&off).await.unwrap();

        let enabled = repo.list_loyalty_enabled().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, "c-on");
    }

    #[tokio::test]
    async fn test_update_loyalty_settings() {
        let db = test_db().await;
        let repo = db.companies();
        repo.insert(&company("c1", "Empresa")).await.unwrap();

        let loyalty = cotiza_core::types::LoyaltySettings {
            enabled: true,
            start_delay_secs: 60,
            frequency_secs: 300,
            discount_percent: dec!(10),
            message_template: "Vuelve pronto".to_string(),
        };
        repo.update_loyalty_settings("c1", &loyalty).await.unwrap();

        let loaded = repo.get_by_id("c1").await.unwrap().unwrap();
        assert!(loaded.loyalty.enabled);
        assert_eq!(loaded.loyalty.start_delay_secs, 60);
        assert_eq!(loaded.loyalty.message_template, "Vuelve pronto");
    }
}
