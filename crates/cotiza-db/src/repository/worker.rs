//! # Worker Repository
//!
//! Database operations for salespeople. Quotes reference workers for the
//! "Vendedor" column on documents and exports; deleting a worker nulls the
//! reference (SET NULL).

use sqlx::SqlitePool;
use tracing::debug;

use cotiza_core::types::Worker;
use cotiza_core::validation::validate_name;

use crate::error::DbResult;

/// Repository for worker database operations.
#[derive(Debug, Clone)]
pub struct WorkerRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct WorkerRow {
    id: String,
    company_id: String,
    name: String,
    email: Option<String>,
}

impl From<WorkerRow> for Worker {
    fn from(row: WorkerRow) -> Worker {
        Worker {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            email: row.email,
        }
    }
}

impl WorkerRepository {
    /// Creates a new WorkerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WorkerRepository { pool }
    }

    /// Inserts a worker.
    pub async fn insert(&self, worker: &Worker) -> DbResult<()> {
        validate_name("name", &worker.name)?;

        debug!(id = %worker.id, name = %worker.name, "Inserting worker");

        sqlx::query(
            "INSERT INTO workers (id, company_id, name, email) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&worker.id)
        .bind(&worker.company_id)
        .bind(&worker.name)
        .bind(&worker.email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a worker by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Worker>> {
        let row: Option<WorkerRow> =
            sqlx::query_as("SELECT id, company_id, name, email FROM workers WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Worker::from))
    }

    /// Lists a company's workers.
    pub async fn list_by_company(&self, company_id: &str) -> DbResult<Vec<Worker>> {
        let rows: Vec<WorkerRow> = sqlx::query_as(
            "SELECT id, company_id, name, email FROM workers WHERE company_id = ?1 ORDER BY name",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Worker::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{company, test_db, worker};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        db.workers()
            .insert(&worker("w1", "c1", "María Pérez"))
            .await
            .unwrap();

        let loaded = db.workers().get_by_id("w1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "María Pérez");
    }
}
