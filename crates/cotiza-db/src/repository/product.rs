//! # Product Repository
//!
//! Database operations for products, including hydration of their tax
//! configuration (single primary link + structured set).
//!
//! ## Hydration
//! ```text
//! products row ──► primary_additional_tax_id ──► tax_definitions (0..1)
//!        │
//!        └──► product_additional_taxes ──► tax_definitions (0..N)
//! ```
//! The hydrated `Product` is what `cotiza_core::tax::TaxSource::for_product`
//! consumes; the priority policy between the two references lives there,
//! not in SQL.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use cotiza_core::types::{Product, TaxDefinition};
use cotiza_core::validation::{validate_amount, validate_name};

use crate::error::{DbError, DbResult};
use crate::repository::parse_decimal;
use crate::repository::tax::TaxRow;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    company_id: String,
    name: String,
    description: Option<String>,
    sku: Option<String>,
    net_price: String,
    primary_tax_rate: String,
    legacy_fixed_tax: String,
    primary_additional_tax_id: Option<String>,
    stock: i64,
    created_at: DateTime<Utc>,
}

const SELECT_COLUMNS: &str = r#"
    id, company_id, name, description, sku,
    net_price, primary_tax_rate, legacy_fixed_tax,
    primary_additional_tax_id, stock, created_at
"#;

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product together with its additional-tax set.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validate_name("name", &product.name)?;
        validate_amount("net_price", product.net_price)?;
        validate_amount("primary_tax_rate", product.primary_tax_rate)?;
        validate_amount("legacy_fixed_tax", product.legacy_fixed_tax)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, company_id, name, description, sku,
                net_price, primary_tax_rate, legacy_fixed_tax,
                primary_additional_tax_id, stock, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.company_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(product.net_price.to_string())
        .bind(product.primary_tax_rate.to_string())
        .bind(product.legacy_fixed_tax.to_string())
        .bind(product.primary_additional_tax.as_ref().map(|t| t.id.clone()))
        .bind(product.stock)
        .bind(product.created_at)
        .execute(&mut *tx)
        .await?;

        for tax in &product.additional_taxes {
            sqlx::query(
                "INSERT INTO product_additional_taxes (product_id, tax_id) VALUES (?1, ?2)",
            )
            .bind(&product.id)
            .bind(&tax.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Gets a product by ID with its tax configuration hydrated.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE id = ?1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Lists all products of a company.
    pub async fn list_by_company(&self, company_id: &str) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE company_id = ?1 ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(self.hydrate(row).await?);
        }
        Ok(products)
    }

    /// Lists a company's in-stock products (stock > 0).
    ///
    /// This is the candidate pool for loyalty promotions; negative stock
    /// never qualifies.
    pub async fn list_in_stock(&self, company_id: &str) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE company_id = ?1 AND stock > 0 ORDER BY created_at, id",
            SELECT_COLUMNS
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(self.hydrate(row).await?);
        }
        Ok(products)
    }

    /// Updates a product's stock level.
    pub async fn update_stock(&self, id: &str, stock: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET stock = ?2 WHERE id = ?1")
            .bind(id)
            .bind(stock)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Deletes a product.
    ///
    /// Historical quote lines keep their frozen prices; their product
    /// reference becomes NULL (schema-level SET NULL).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Attaches the tax configuration to a raw row.
    async fn hydrate(&self, row: ProductRow) -> DbResult<Product> {
        let primary_additional_tax = match &row.primary_additional_tax_id {
            Some(tax_id) => {
                let tax: Option<TaxRow> = sqlx::query_as(
                    "SELECT id, company_id, name, kind, value, basis, created_at
                     FROM tax_definitions WHERE id = ?1",
                )
                .bind(tax_id)
                .fetch_optional(&self.pool)
                .await?;
                tax.map(TaxDefinition::try_from).transpose()?
            }
            None => None,
        };

        let tax_rows: Vec<TaxRow> = sqlx::query_as(
            r#"
            SELECT t.id, t.company_id, t.name, t.kind, t.value, t.basis, t.created_at
            FROM tax_definitions t
            JOIN product_additional_taxes pat ON pat.tax_id = t.id
            WHERE pat.product_id = ?1
            ORDER BY t.created_at, t.id
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let additional_taxes = tax_rows
            .into_iter()
            .map(TaxDefinition::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Product {
            net_price: parse_decimal("products.net_price", &row.net_price)?,
            primary_tax_rate: parse_decimal("products.primary_tax_rate", &row.primary_tax_rate)?,
            legacy_fixed_tax: parse_decimal("products.legacy_fixed_tax", &row.legacy_fixed_tax)?,
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            description: row.description,
            sku: row.sku,
            primary_additional_tax,
            additional_taxes,
            stock: row.stock,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{
        company, product, tax_definition, test_db, TaxBasis, TaxKind,
    };
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_and_hydrate_taxes() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        let primary = tax_definition("t-prim", "c1", TaxKind::Fixed, dec!(40), TaxBasis::OnNet);
        let set_a = tax_definition("t-a", "c1", TaxKind::Percentage, dec!(10), TaxBasis::OnNet);
        db.taxes().insert(&primary).await.unwrap();
        db.taxes().insert(&set_a).await.unwrap();

        let mut p = product("p1", "c1", dec!(1000), 5);
        p.primary_additional_tax = Some(primary);
        p.additional_taxes = vec![set_a];
        db.products().insert(&p).await.unwrap();

        let loaded = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert_eq!(loaded.net_price, dec!(1000));
        assert_eq!(loaded.primary_additional_tax.as_ref().unwrap().id, "t-prim");
        assert_eq!(loaded.additional_taxes.len(), 1);
        assert_eq!(loaded.additional_taxes[0].value, dec!(10));
    }

    #[tokio::test]
    async fn test_list_in_stock_excludes_zero_and_negative() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        db.products()
            .insert(&product("p-in", "c1", dec!(100), 3))
            .await
            .unwrap();
        db.products()
            .insert(&product("p-zero", "c1", dec!(100), 0))
            .await
            .unwrap();
        db.products()
            .insert(&product("p-neg", "c1", dec!(100), -2))
            .await
            .unwrap();

        let in_stock = db.products().list_in_stock("c1").await.unwrap();
        assert_eq!(in_stock.len(), 1);
        assert_eq!(in_stock[0].id, "p-in");
    }

    #[tokio::test]
    async fn test_deleting_tax_definition_nulls_primary_link() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        let primary = tax_definition("t1", "c1", TaxKind::Fixed, dec!(25), TaxBasis::OnNet);
        db.taxes().insert(&primary).await.unwrap();

        let mut p = product("p1", "c1", dec!(500), 1);
        p.primary_additional_tax = Some(primary);
        db.products().insert(&p).await.unwrap();

        db.taxes().delete("t1").await.unwrap();

        let loaded = db.products().get_by_id("p1").await.unwrap().unwrap();
        assert!(loaded.primary_additional_tax.is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_negative_price() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        let mut p = product("p1", "c1", dec!(100), 1);
        p.net_price = dec!(-5);
        let err = db.products().insert(&p).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
