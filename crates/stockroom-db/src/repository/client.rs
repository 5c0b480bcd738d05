//! # Client Repository
//!
//! Customers that transactions can be booked against on credit.
//!
//! ## Outstanding Balance
//! ```text
//! balance(client) = Σ (total_amount − Σ payments)   over unpaid sales
//! ```
//! Settled transactions contribute nothing. Purchases booked against a
//! supplier client are owed by the store, not to it, so they are left out. The transaction engine compares
//! `balance + new unpaid remainder` with `credit_limit` before committing.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use stockroom_core::validation::validate_new_client;
use stockroom_core::{Client, Money, NewClient, TransactionType};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::DbResult;

/// Repository for clients.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        ClientRepository { pool, write_gate }
    }

    /// Inserts a new client.
    ///
    /// ## Returns
    /// * `Err(DbError::Rule)` - Empty name or negative credit limit
    pub async fn create_client(&self, new: NewClient) -> DbResult<Client> {
        validate_new_client(&new)?;

        let now = Utc::now();
        let name = new.name.trim().to_string();

        let _gate = self.write_gate.lock().await;
        let result = sqlx::query(
            r#"
            INSERT INTO clients (name, contact, address, credit_limit, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&name)
        .bind(&new.contact)
        .bind(&new.address)
        .bind(new.credit_limit)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let client = Client {
            id: result.last_insert_rowid(),
            name,
            contact: new.contact,
            address: new.address,
            credit_limit: new.credit_limit,
            created_at: now,
        };

        info!(client_id = client.id, credit_limit = %client.credit_limit, "Client created");
        Ok(client)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Client>> {
        let mut conn = self.pool.acquire().await?;
        fetch_client_on(&mut conn, id).await
    }

    /// What the client still owes across all unpaid sales.
    pub async fn outstanding_balance(&self, client_id: i64) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        outstanding_balance_on(&mut conn, client_id).await
    }
}

pub(crate) async fn fetch_client_on(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, name, contact, address, credit_limit, created_at
        FROM clients
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(client)
}

pub(crate) async fn outstanding_balance_on(
    conn: &mut SqliteConnection,
    client_id: i64,
) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(t.total_amount - COALESCE(
            (SELECT SUM(p.amount) FROM payments p WHERE p.transaction_id = t.id), 0
        )), 0)
        FROM transactions t
        WHERE t.client_id = ?1 AND t.is_paid = 0 AND t.transaction_type = ?2
        "#,
    )
    .bind(client_id)
    .bind(TransactionType::Sale)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures;
    use stockroom_core::CoreError;
    use stockroom_core::{NewTransaction, NewTransactionItem, Quantity};

    #[tokio::test]
    async fn test_create_and_read_back() {
        let db = fixtures::db().await;
        let client = fixtures::client(&db, 10_000).await;

        let loaded = db.clients().get_by_id(client.id).await.unwrap().unwrap();
        assert_eq!(loaded, client);
        assert_eq!(loaded.credit_limit, Money::from_cents(10_000));
        assert!(db.clients().get_by_id(client.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_limit_is_rejected() {
        let db = fixtures::db().await;
        let err = db
            .clients()
            .create_client(NewClient {
                name: "Corner Shop".to_string(),
                credit_limit: Money::from_cents(-100),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Rule(_)));
    }

    #[tokio::test]
    async fn test_balance_counts_unpaid_remainders_only() {
        let db = fixtures::db().await;
        let widget = fixtures::widget(&db, 1_000).await;
        fixtures::lot(&db, widget.id, "A", 10, 400).await;
        let client = fixtures::client(&db, 100_000).await;

        assert_eq!(db.clients().outstanding_balance(client.id).await.unwrap(), Money::zero());

        let sale = |units| {
            NewTransaction::new(TransactionType::Sale)
                .for_client(client.id)
                .item(NewTransactionItem::new(widget.id, Quantity::from_units(units)))
        };

        // $30.00, $10.00 paid at the counter
        db.transactions()
            .commit(sale(3).payment(Money::from_cents(1_000)))
            .await
            .unwrap();
        // $20.00, fully paid
        db.transactions()
            .commit(sale(2).payment(Money::from_cents(2_000)))
            .await
            .unwrap();

        assert_eq!(
            db.clients().outstanding_balance(client.id).await.unwrap(),
            Money::from_cents(2_000)
        );
    }

    #[tokio::test]
    async fn test_unpaid_purchase_is_not_owed_by_the_supplier() {
        let db = fixtures::db().await;
        let widget = fixtures::widget(&db, 1_000).await;
        let supplier = fixtures::client(&db, 0).await;

        // $80.00 of goods received on account, limit 0: the store owes this
        let purchase = db
            .transactions()
            .commit(
                NewTransaction::new(TransactionType::Purchase)
                    .for_client(supplier.id)
                    .item(
                        NewTransactionItem::new(widget.id, Quantity::from_units(20))
                            .at_price(Money::from_cents(400)),
                    ),
            )
            .await
            .unwrap();

        assert!(!purchase.transaction.is_paid);
        assert_eq!(
            db.clients().outstanding_balance(supplier.id).await.unwrap(),
            Money::zero()
        );

        // a sale on account to the same client is still held to its limit
        let err = db
            .transactions()
            .commit(
                NewTransaction::new(TransactionType::Sale)
                    .for_client(supplier.id)
                    .item(NewTransactionItem::new(widget.id, Quantity::from_units(1))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err.rule(), Some(CoreError::CreditLimitExceeded { .. })));
    }
}
