//! # Stock Repository (Inventory Ledger)
//!
//! Stock lots: receiving, deducting and restocking.
//!
//! ## Deduction Without Lost Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Two terminals sell from lot 4 (qty 6)                  │
//! │                                                                         │
//! │  ❌ Read-then-write                                                     │
//! │     A: SELECT quantity → 6        B: SELECT quantity → 6               │
//! │     A: UPDATE quantity = 6 - 5    B: UPDATE quantity = 6 - 5           │
//! │     → 10 sold out of 6, lot shows 1                                    │
//! │                                                                         │
//! │  ✅ Conditional update (what this module does)                          │
//! │     UPDATE stock SET quantity = quantity - 5                           │
//! │     WHERE id = 4 AND quantity >= 5                                     │
//! │     A: 1 row  → lot now 1                                              │
//! │     B: 0 rows → InsufficientStock { available: 1, requested: 5 }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writers also hold the database write gate for their whole transaction,
//! so a multi-lot commit never observes another commit half-done.
//!
//! The `*_on` functions run on a caller-supplied connection so the
//! transaction engine can chain them inside its own transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use stockroom_core::validation::{validate_name, validate_non_negative_money, validate_quantity};
use stockroom_core::{CoreError, Money, Quantity, Stock, ValidationError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::product::fetch_product_on;

/// Repository for stock lots.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl StockRepository {
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        StockRepository { pool, write_gate }
    }

    /// Receives a new lot of `product_id`.
    ///
    /// ## Returns
    /// * `Ok(Stock)` - The new lot
    /// * `Err(DbError::NotFound)` - No such product
    /// * `Err(DbError::Rule)` - Empty group, quantity <= 0 or negative cost
    pub async fn receive_stock(
        &self,
        product_id: i64,
        stock_group: &str,
        quantity: Quantity,
        unit_cost: Money,
    ) -> DbResult<Stock> {
        validate_name("stock_group", stock_group)?;
        validate_quantity(quantity)?;
        validate_non_negative_money("cost_price", unit_cost)?;

        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        if fetch_product_on(&mut tx, product_id).await?.is_none() {
            return Err(DbError::not_found("Product", product_id));
        }

        let lot = insert_lot_on(&mut tx, product_id, stock_group.trim(), quantity, unit_cost).await?;
        tx.commit().await?;

        info!(
            stock_id = lot.id,
            product_id,
            group = %lot.stock_group,
            quantity = %quantity,
            "Stock received"
        );
        Ok(lot)
    }

    /// Atomically removes `quantity` from a lot.
    ///
    /// Either the whole quantity is removed or nothing changes.
    ///
    /// ## Returns
    /// * `Ok(Stock)` - The lot after deduction
    /// * `Err(DbError::Rule(CoreError::InsufficientStock))` - Lot holds less
    /// * `Err(DbError::NotFound)` - No such lot
    pub async fn reserve_and_deduct(&self, stock_id: i64, quantity: Quantity) -> DbResult<Stock> {
        validate_quantity(quantity)?;

        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let lot = deduct_on(&mut tx, stock_id, quantity).await?;
        tx.commit().await?;

        debug!(stock_id, quantity = %quantity, remaining = %lot.quantity, "Stock deducted");
        Ok(lot)
    }

    /// Adds `quantity` to an existing lot.
    pub async fn restock(&self, stock_id: i64, quantity: Quantity) -> DbResult<Stock> {
        validate_quantity(quantity)?;

        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let lot = restock_on(&mut tx, stock_id, quantity).await?;
        tx.commit().await?;

        debug!(stock_id, quantity = %quantity, "Lot restocked");
        Ok(lot)
    }

    pub async fn get_by_id(&self, stock_id: i64) -> DbResult<Option<Stock>> {
        let mut conn = self.pool.acquire().await?;
        fetch_lot_on(&mut conn, stock_id).await
    }

    /// Lots of a product, oldest first.
    pub async fn list_for_product(&self, product_id: i64) -> DbResult<Vec<Stock>> {
        let mut conn = self.pool.acquire().await?;
        lots_for_product_on(&mut conn, product_id).await
    }

    /// Total quantity across all lots of a product.
    pub async fn available_for_product(&self, product_id: i64) -> DbResult<Quantity> {
        let milli: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM stock WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Quantity::from_milli(milli))
    }
}

// =============================================================================
// Connection-Level Statements
// =============================================================================

pub(crate) async fn fetch_lot_on(conn: &mut SqliteConnection, stock_id: i64) -> DbResult<Option<Stock>> {
    let lot = sqlx::query_as::<_, Stock>(
        r#"
        SELECT id, product_id, stock_group, quantity, cost_price, created_at
        FROM stock
        WHERE id = ?1
        "#,
    )
    .bind(stock_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(lot)
}

pub(crate) async fn lots_for_product_on(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> DbResult<Vec<Stock>> {
    let lots = sqlx::query_as::<_, Stock>(
        r#"
        SELECT id, product_id, stock_group, quantity, cost_price, created_at
        FROM stock
        WHERE product_id = ?1
        ORDER BY created_at, id
        "#,
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lots)
}

pub(crate) async fn insert_lot_on(
    conn: &mut SqliteConnection,
    product_id: i64,
    stock_group: &str,
    quantity: Quantity,
    cost_price: Money,
) -> DbResult<Stock> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO stock (product_id, stock_group, quantity, cost_price, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(product_id)
    .bind(stock_group)
    .bind(quantity)
    .bind(cost_price)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(Stock {
        id: result.last_insert_rowid(),
        product_id,
        stock_group: stock_group.to_string(),
        quantity,
        cost_price,
        created_at: now,
    })
}

/// Conditional decrement. Leaves the lot untouched unless it holds at least
/// `quantity`.
pub(crate) async fn deduct_on(
    conn: &mut SqliteConnection,
    stock_id: i64,
    quantity: Quantity,
) -> DbResult<Stock> {
    let result = sqlx::query(
        "UPDATE stock SET quantity = quantity - ?2 WHERE id = ?1 AND quantity >= ?2",
    )
    .bind(stock_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    let lot = fetch_lot_on(conn, stock_id)
        .await?
        .ok_or_else(|| DbError::not_found("Stock", stock_id))?;

    if result.rows_affected() == 0 {
        return Err(CoreError::InsufficientStock {
            stock_id,
            available: lot.quantity,
            requested: quantity,
        }
        .into());
    }

    Ok(lot)
}

pub(crate) async fn restock_on(
    conn: &mut SqliteConnection,
    stock_id: i64,
    quantity: Quantity,
) -> DbResult<Stock> {
    // SQLite turns an overflowing integer sum into REAL; refuse it instead.
    let result = sqlx::query(
        "UPDATE stock SET quantity = quantity + ?2 WHERE id = ?1 AND quantity <= ?3 - ?2",
    )
    .bind(stock_id)
    .bind(quantity)
    .bind(i64::MAX)
    .execute(&mut *conn)
    .await?;

    let lot = fetch_lot_on(conn, stock_id)
        .await?
        .ok_or_else(|| DbError::not_found("Stock", stock_id))?;

    if result.rows_affected() == 0 {
        return Err(CoreError::from(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        })
        .into());
    }

    Ok(lot)
}

// =============================================================================
// Unit Tests
// =============================================================================
