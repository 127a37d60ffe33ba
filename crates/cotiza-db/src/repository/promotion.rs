//! # Promotion History Repository
//!
//! Append-only log of sent loyalty promotions. The most recent entry per
//! (company, client) pair is what the cooldown gate reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

use cotiza_core::types::PromotionHistoryEntry;

use crate::error::{DbError, DbResult};
use crate::repository::{new_id, parse_decimal};

/// Repository for promotion history database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct PromotionRow {
    id: String,
    company_id: String,
    client_id: String,
    sent_at: DateTime<Utc>,
    discount_offered: String,
    message_summary: String,
}

impl TryFrom<PromotionRow> for PromotionHistoryEntry {
    type Error = DbError;

    fn try_from(row: PromotionRow) -> DbResult<PromotionHistoryEntry> {
        Ok(PromotionHistoryEntry {
            discount_offered: parse_decimal(
                "promotion_history.discount_offered",
                &row.discount_offered,
            )?,
            id: row.id,
            company_id: row.company_id,
            client_id: row.client_id,
            sent_at: row.sent_at,
            message_summary: row.message_summary,
        })
    }
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Appends a promotion history entry.
    ///
    /// Called ONLY after the promotion email was delivered; a failed send
    /// leaves no trace so the client stays eligible for the next pass.
    pub async fn append(
        &self,
        company_id: &str,
        client_id: &str,
        sent_at: DateTime<Utc>,
        discount_offered: Decimal,
        message_summary: &str,
    ) -> DbResult<PromotionHistoryEntry> {
        let entry = PromotionHistoryEntry {
            id: new_id(),
            company_id: company_id.to_string(),
            client_id: client_id.to_string(),
            sent_at,
            discount_offered,
            message_summary: message_summary.to_string(),
        };

        debug!(
            company_id = %company_id,
            client_id = %client_id,
            "Recording sent promotion"
        );

        sqlx::query(
            r#"
            INSERT INTO promotion_history (
                id, company_id, client_id, sent_at, discount_offered, message_summary
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.company_id)
        .bind(&entry.client_id)
        .bind(entry.sent_at)
        .bind(entry.discount_offered.to_string())
        .bind(&entry.message_summary)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// The most recent promotion sent to a client, if any.
    ///
    /// This single row gates the cooldown window.
    pub async fn latest_for(
        &self,
        company_id: &str,
        client_id: &str,
    ) -> DbResult<Option<PromotionHistoryEntry>> {
        let row: Option<PromotionRow> = sqlx::query_as(
            r#"
            SELECT id, company_id, client_id, sent_at, discount_offered, message_summary
            FROM promotion_history
            WHERE company_id = ?1 AND client_id = ?2
            ORDER BY sent_at DESC
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PromotionHistoryEntry::try_from).transpose()
    }

    /// Lists a company's promotion history, newest first.
    pub async fn list_by_company(&self, company_id: &str) -> DbResult<Vec<PromotionHistoryEntry>> {
        let rows: Vec<PromotionRow> = sqlx::query_as(
            r#"
            SELECT id, company_id, client_id, sent_at, discount_offered, message_summary
            FROM promotion_history
            WHERE company_id = ?1
            ORDER BY sent_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(PromotionHistoryEntry::try_from)
            .collect()
    }

    /// Number of entries for a (company, client) pair. Test / diagnostics aid.
    pub async fn count_for(&self, company_id: &str, client_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM promotion_history WHERE company_id = ?1 AND client_id = ?2",
        )
        .bind(company_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{client, company, test_db};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_latest_for_returns_most_recent() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();
        db.clients().insert(&client("cl1", "c1")).await.unwrap();

        let repo = db.promotions();
        let now = Utc::now();

        repo.append("c1", "cl1", now - Duration::days(10), dec!(5), "Oferta A - 5% OFF")
            .await
            .unwrap();
        repo.append("c1", "cl1", now, dec!(10), "Oferta B - 10% OFF")
            .await
            .unwrap();

        let latest = repo.latest_for("c1", "cl1").await.unwrap().unwrap();
        assert_eq!(latest.discount_offered, dec!(10));
        assert_eq!(latest.message_summary, "Oferta B - 10% OFF");
    }

    #[tokio::test]
    async fn test_latest_for_is_scoped_to_the_pair() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();
        db.clients().insert(&client("cl1", "c1")).await.unwrap();
        db.clients().insert(&client("cl2", "c1")).await.unwrap();

        let repo = db.promotions();
        repo.append("c1", "cl1", Utc::now(), dec!(5), "Oferta - 5% OFF")
            .await
            .unwrap();

        assert!(repo.latest_for("c1", "cl2").await.unwrap().is_none());
        assert_eq!(repo.count_for("c1", "cl1").await.unwrap(), 1);
    }
}
