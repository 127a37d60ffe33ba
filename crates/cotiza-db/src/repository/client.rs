//! # Client Repository
//!
//! Database operations for clients. `registered_at` is written once at
//! creation and never updated; it drives the loyalty start-delay gate.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use cotiza_core::types::Client;
use cotiza_core::validation::{validate_email, validate_name};

use crate::error::DbResult;

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    company_id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    rut: Option<String>,
    registered_at: Option<DateTime<Utc>>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Client {
        Client {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            rut: row.rut,
            registered_at: row.registered_at,
        }
    }
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a client.
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        validate_name("name", &client.name)?;
        if let Some(email) = &client.email {
            validate_email(email)?;
        }

        debug!(id = %client.id, name = %client.name, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, company_id, name, email, phone, rut, registered_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&client.id)
        .bind(&client.company_id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.rut)
        .bind(client.registered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a client by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(
            "SELECT id, company_id, name, email, phone, rut, registered_at
             FROM clients WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    /// Lists a company's clients.
    ///
    /// The loyalty pass walks this list in order, one client at a time.
    pub async fn list_by_company(&self, company_id: &str) -> DbResult<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as(
            "SELECT id, company_id, name, email, phone, rut, registered_at
             FROM clients WHERE company_id = ?1 ORDER BY registered_at, id",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::{client, company, test_db};

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        db.clients().insert(&client("cl1", "c1")).await.unwrap();
        db.clients().insert(&client("cl2", "c1")).await.unwrap();

        let clients = db.clients().list_by_company("c1").await.unwrap();
        assert_eq!(clients.len(), 2);
        assert!(clients[0].registered_at.is_some());
    }

    #[tokio::test]
    async fn test_insert_rejects_malformed_email() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        let mut bad = client("cl1", "c1");
        bad.email = Some("no-es-un-correo".to_string());
        let err = db.clients().insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_client_without_email_is_allowed() {
        let db = test_db().await;
        db.companies().insert(&company("c1", "Empresa")).await.unwrap();

        let mut quiet = client("cl1", "c1");
        quiet.email = None;
        db.clients().insert(&quiet).await.unwrap();

        let loaded = db.clients().get_by_id("cl1").await.unwrap().unwrap();
        assert!(loaded.email.is_none());
    }
}
