//! # Tax Definition Repository
//!
//! Database operations for company-owned additional tax definitions.
//!
//! Deleting a definition nulls the `primary_additional_tax_id` link on
//! referencing products and removes its join-table rows (schema-level
//! SET NULL / CASCADE); historical quote lines are unaffected because tax
//! math always runs from frozen line prices.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use cotiza_core::types::{TaxBasis, TaxDefinition, TaxKind};

use crate::error::{DbError, DbResult};
use crate::repository::parse_decimal;

/// Repository for tax definition database operations.
#[derive(Debug, Clone)]
pub struct TaxRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
pub(crate) struct TaxRow {
    id: String,
    company_id: String,
    name: String,
    kind: TaxKind,
    value: String,
    basis: TaxBasis,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaxRow> for TaxDefinition {
    type Error = DbError;

    fn try_from(row: TaxRow) -> DbResult<TaxDefinition> {
        Ok(TaxDefinition {
            value: parse_decimal("tax_definitions.value", &row.value)?,
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            kind: row.kind,
            basis: row.basis,
            created_at: row.created_at,
        })
    }
}

impl TaxRepository {
    /// Creates a new TaxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TaxRepository { pool }
    }

    /// Inserts a tax definition.
    pub async fn insert(&self, tax: &TaxDefinition) -> DbResult<()> {
        debug!(id = %tax.id, name = %tax.name, "Inserting tax definition");

        sqlx::query(
            r#"
            INSERT INTO tax_definitions (id, company_id, name, kind, value, basis, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&tax.id)
        .bind(&tax.company_id)
        .bind(&tax.name)
        .bind(tax.kind)
        .bind(tax.value.to_string())
        .bind(tax.basis)
        .bind(tax.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a tax definition by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TaxDefinition>> {
        let row: Option<TaxRow> = sqlx::query_as(
            "SELECT id, company_id, name, kind, value, basis, created_at
             FROM tax_definitions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaxDefinition::try_from).transpose()
    }

    /// Lists a company's tax definitions.
    pub async fn list_by_company(&self, company_id: &str) -> DbResult<Vec<TaxDefinition>> {
        let rows: Vec<TaxRow> = sqlx::query_as(
            "SELECT id, company_id, name, kind, value, basis, created_at
             FROM tax_definitions WHERE company_id = ?1 ORDER BY created_at, id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaxDefinition::try_from).collect()
    }

    /// Deletes a tax definition by explicit removal.
    ///
    /// Referencing products keep working: the primary link becomes NULL and
    /// join rows disappear, dropping the definition out of future tax
    /// source resolution.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting tax definition");

        let result = sqlx::query("DELETE FROM tax_definitions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TaxDefinition", id));
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
    use crate::repository::test_support::{company, tax_definition, test_db};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        let repo = db.taxes();
        repo.insert(&tax_definition(
            "t1",
            "c1",
            TaxKind::Percentage,
            dec!(10),
            TaxBasis::OnNet,
        ))
        .await
        .unwrap();
        repo.insert(&tax_definition(
            "t2",
            "c1",
            TaxKind::Fixed,
            dec!(50),
            TaxBasis::OnGrossWithPrimary,
        ))
        .await
        .unwrap();

        let taxes = repo.list_by_company("c1").await.unwrap();
        assert_eq!(taxes.len(), 2);
        assert_eq!(taxes[0].kind, TaxKind::Percentage);
        assert_eq!(taxes[1].value, dec!(50));
        assert_eq!(taxes[1].basis, TaxBasis::OnGrossWithPrimary);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let db = test_db().await;
        let err = db.taxes().delete("ghost").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
