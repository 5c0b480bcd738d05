//! # Transaction Repository (Transaction Engine)
//!
//! Commits sales, purchases and adjustments atomically: header, items,
//! stock movements and counter payments either all land or none do.
//!
//! ## Commit Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       commit(NewTransaction)                            │
//! │                                                                         │
//! │  validate shape (items, quantities, prices, payments)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  write gate ──► BEGIN                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  per item:                                                             │
//! │    sale / adjustment ── explicit lot or FIFO split ── deduct_on()      │
//! │    purchase ─────────── explicit lot: restock_on()                     │
//! │                         otherwise:     insert_lot_on()                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total = Σ round(price × qty)                                          │
//! │  payments ≤ total?                          no → Overpayment           │
//! │  sale: balance + unpaid ≤ credit_limit?     no → CreditLimitExceeded   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT transactions, transaction_items, payments ──► COMMIT           │
//! │                                                                         │
//! │  Any error before COMMIT drops the sqlx transaction: every deduction   │
//! │  made so far is rolled back.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Resolution
//! | Type         | No override given                 |
//! |--------------|-----------------------------------|
//! | `Sale`       | product's current price           |
//! | `Adjustment` | cost price of the consumed lot    |
//! | `Purchase`   | cost price of the named lot; a new lot needs an explicit price |

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use stockroom_core::allocation::{allocate_fifo, LotBalance};
use stockroom_core::ledger::{
    accept_payment, accept_payments, check_credit, is_settled, transaction_total,
};
use stockroom_core::validation::validate_new_transaction;
use stockroom_core::{
    CommittedTransaction, CoreError, Money, NewTransaction, NewTransactionItem, Payment, Product,
    Quantity, Stock, Transaction, TransactionItem, TransactionType, ValidationError,
    DEFAULT_PURCHASE_GROUP,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::client::{fetch_client_on, outstanding_balance_on};
use crate::repository::product::fetch_product_on;
use crate::repository::stock::{deduct_on, fetch_lot_on, insert_lot_on, lots_for_product_on, restock_on};

/// One resolved line: a quantity drawn from (or added to) one lot at a
/// fixed price.
#[derive(Debug, Clone, Copy)]
struct PlannedLine {
    product_id: i64,
    stock_id: i64,
    quantity: Quantity,
    price: Money,
}

/// Repository for transactions, their items and payments.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        TransactionRepository { pool, write_gate }
    }

    /// Commits a transaction with all its stock movements and counter
    /// payments.
    ///
    /// ## Returns
    /// * `Ok(CommittedTransaction)` - Header, items (one per lot touched) and payments
    /// * `Err(DbError::NotFound)` - Unknown client, product or lot
    /// * `Err(DbError::Rule(_))` - Validation, insufficient stock, overpayment,
    ///   credit limit or lot/product mismatch. Nothing was written.
    pub async fn commit(&self, request: NewTransaction) -> DbResult<CommittedTransaction> {
        let transaction_type = request.transaction_type;

        self.commit_gated(request).await.inspect_err(|err| {
            if let Some(rule) = err.rule() {
                warn!(transaction_type = %transaction_type, reason = %rule, "Transaction rejected");
            }
        })
    }

    async fn commit_gated(&self, request: NewTransaction) -> DbResult<CommittedTransaction> {
        validate_new_transaction(&request)?;

        let transaction_type = request.transaction_type;
        debug!(
            transaction_type = %transaction_type,
            items = request.items.len(),
            "Committing transaction"
        );

        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let client = match request.client_id {
            Some(client_id) => Some(
                fetch_client_on(&mut tx, client_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Client", client_id))?,
            ),
            None => None,
        };

        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = fetch_product_on(&mut tx, item.product_id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", item.product_id))?;

            if transaction_type.consumes_stock() {
                lines.extend(consume_item(&mut tx, transaction_type, &product, item).await?);
            } else {
                lines.push(purchase_item(&mut tx, &product, item).await?);
            }
        }

        let total = transaction_total(lines.iter().map(|line| (line.price, line.quantity)))?;
        let paid = accept_payments(total, &request.payments)?;

        if let Some(client) = client.as_ref().filter(|_| transaction_type.draws_credit()) {
            let balance = outstanding_balance_on(&mut tx, client.id).await?;
            check_credit(
                client.id,
                client.credit_limit,
                balance,
                total.saturating_remainder(paid),
            )?;
        }

        let now = Utc::now();
        let is_paid = is_settled(total, paid);

        let result = sqlx::query(
            r#"
            INSERT INTO transactions (transaction_type, client_id, total_amount, is_paid, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(transaction_type)
        .bind(request.client_id)
        .bind(total)
        .bind(is_paid)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let transaction = Transaction {
            id: result.last_insert_rowid(),
            transaction_type,
            client_id: request.client_id,
            total_amount: total,
            is_paid,
            created_at: now,
        };

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            items.push(insert_item_on(&mut tx, transaction.id, line, now).await?);
        }

        let mut payments = Vec::with_capacity(request.payments.len());
        for amount in &request.payments {
            payments.push(insert_payment_on(&mut tx, transaction.id, *amount, now).await?);
        }

        tx.commit().await?;

        info!(
            transaction_id = transaction.id,
            transaction_type = %transaction_type,
            total = %total,
            paid = %paid,
            is_paid,
            "Transaction committed"
        );

        Ok(CommittedTransaction {
            transaction,
            items,
            payments,
        })
    }

    /// Records a payment against an existing transaction.
    ///
    /// `is_paid` flips once payments reach the total. A settled transaction
    /// accepts no further payments.
    ///
    /// ## Returns
    /// * `Ok(Transaction)` - The header after the payment
    /// * `Err(DbError::Rule(CoreError::Overpayment))` - Payment would exceed the total
    pub async fn record_payment(&self, transaction_id: i64, amount: Money) -> DbResult<Transaction> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let mut transaction = fetch_transaction_on(&mut tx, transaction_id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", transaction_id))?;

        let paid_so_far = total_paid_on(&mut tx, transaction_id).await?;
        let paid = accept_payment(
            Some(transaction_id),
            transaction.total_amount,
            paid_so_far,
            amount,
        )?;

        insert_payment_on(&mut tx, transaction_id, amount, Utc::now()).await?;

        if !transaction.is_paid && is_settled(transaction.total_amount, paid) {
            sqlx::query("UPDATE transactions SET is_paid = 1 WHERE id = ?1")
                .bind(transaction_id)
                .execute(&mut *tx)
                .await?;
            transaction.is_paid = true;
        }

        tx.commit().await?;

        info!(
            transaction_id,
            amount = %amount,
            paid = %paid,
            is_paid = transaction.is_paid,
            "Payment recorded"
        );
        Ok(transaction)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_transaction_on(&mut conn, id).await
    }

    pub async fn get_items(&self, transaction_id: i64) -> DbResult<Vec<TransactionItem>> {
        let items = sqlx::query_as::<_, TransactionItem>(
            r#"
            SELECT id, transaction_id, product_id, stock_id, quantity, price, created_at
            FROM transaction_items
            WHERE transaction_id = ?1
            ORDER BY id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_payments(&self, transaction_id: i64) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, transaction_id, amount, payment_date
            FROM payments
            WHERE transaction_id = ?1
            ORDER BY payment_date, id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn get_total_paid(&self, transaction_id: i64) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        total_paid_on(&mut conn, transaction_id).await
    }

    /// A client's unpaid transactions, oldest first.
    pub async fn list_unpaid_for_client(&self, client_id: i64) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, transaction_type, client_id, total_amount, is_paid, created_at
            FROM transactions
            WHERE client_id = ?1 AND is_paid = 0
            ORDER BY created_at, id
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}

// =============================================================================
// Line Resolution
// =============================================================================

/// Loads a named lot and checks it belongs to `product`.
async fn named_lot_on(conn: &mut SqliteConnection, product: &Product, stock_id: i64) -> DbResult<Stock> {
    let lot = fetch_lot_on(conn, stock_id)
        .await?
        .ok_or_else(|| DbError::not_found("Stock", stock_id))?;

    if lot.product_id != product.id {
        return Err(CoreError::LotProductMismatch {
            stock_id,
            product_id: product.id,
            lot_product_id: lot.product_id,
        }
        .into());
    }

    Ok(lot)
}

/// Deducts a sale or adjustment line, splitting it over lots oldest-first
/// when no lot is named.
async fn consume_item(
    conn: &mut SqliteConnection,
    transaction_type: TransactionType,
    product: &Product,
    item: &NewTransactionItem,
) -> DbResult<Vec<PlannedLine>> {
    let default_price = |lot: &Stock| match transaction_type {
        TransactionType::Adjustment => lot.cost_price,
        _ => product.price,
    };

    if let Some(stock_id) = item.stock_id {
        let lot = named_lot_on(conn, product, stock_id).await?;
        deduct_on(conn, stock_id, item.quantity).await?;

        return Ok(vec![PlannedLine {
            product_id: product.id,
            stock_id,
            quantity: item.quantity,
            price: item.price.unwrap_or_else(|| default_price(&lot)),
        }]);
    }

    let lots = lots_for_product_on(conn, product.id).await?;
    let balances: Vec<LotBalance> = lots
        .iter()
        .map(|lot| LotBalance {
            stock_id: lot.id,
            quantity: lot.quantity,
        })
        .collect();
    let by_id: HashMap<i64, &Stock> = lots.iter().map(|lot| (lot.id, lot)).collect();

    let plan = allocate_fifo(product.id, &balances, item.quantity)?;

    let mut lines = Vec::with_capacity(plan.len());
    for allocation in plan {
        deduct_on(conn, allocation.stock_id, allocation.quantity).await?;

        let price = match (item.price, by_id.get(&allocation.stock_id)) {
            (Some(price), _) => price,
            (None, Some(lot)) => default_price(*lot),
            (None, None) => product.price,
        };

        lines.push(PlannedLine {
            product_id: product.id,
            stock_id: allocation.stock_id,
            quantity: allocation.quantity,
            price,
        });
    }

    debug!(product_id = product.id, lots = lines.len(), "Allocated line oldest-first");
    Ok(lines)
}

/// Books a purchase line into a named lot or a newly received one.
async fn purchase_item(
    conn: &mut SqliteConnection,
    product: &Product,
    item: &NewTransactionItem,
) -> DbResult<PlannedLine> {
    if let Some(stock_id) = item.stock_id {
        let lot = named_lot_on(conn, product, stock_id).await?;
        restock_on(conn, stock_id, item.quantity).await?;

        return Ok(PlannedLine {
            product_id: product.id,
            stock_id,
            quantity: item.quantity,
            price: item.price.unwrap_or(lot.cost_price),
        });
    }

    let price = item.price.ok_or_else(|| ValidationError::Required {
        field: "price".to_string(),
    })?;
    let group = item
        .stock_group
        .as_deref()
        .map(str::trim)
        .unwrap_or(DEFAULT_PURCHASE_GROUP);

    let lot = insert_lot_on(conn, product.id, group, item.quantity, price).await?;

    Ok(PlannedLine {
        product_id: product.id,
        stock_id: lot.id,
        quantity: item.quantity,
        price,
    })
}

// =============================================================================
// Connection-Level Statements
// =============================================================================

async fn fetch_transaction_on(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Transaction>> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, transaction_type, client_id, total_amount, is_paid, created_at
        FROM transactions
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(transaction)
}

async fn total_paid_on(conn: &mut SqliteConnection, transaction_id: i64) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE transaction_id = ?1",
    )
    .bind(transaction_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(Money::from_cents(cents))
}

async fn insert_item_on(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    line: &PlannedLine,
    created_at: DateTime<Utc>,
) -> DbResult<TransactionItem> {
    let result = sqlx::query(
        r#"
        INSERT INTO transaction_items (transaction_id, product_id, stock_id, quantity, price, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(transaction_id)
    .bind(line.product_id)
    .bind(line.stock_id)
    .bind(line.quantity)
    .bind(line.price)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(TransactionItem {
        id: result.last_insert_rowid(),
        transaction_id,
        product_id: line.product_id,
        stock_id: line.stock_id,
        quantity: line.quantity,
        price: line.price,
        created_at,
    })
}

async fn insert_payment_on(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    amount: Money,
    payment_date: DateTime<Utc>,
) -> DbResult<Payment> {
    let result = sqlx::query(
        "INSERT INTO payments (transaction_id, amount, payment_date) VALUES (?1, ?2, ?3)",
    )
    .bind(transaction_id)
    .bind(amount)
    .bind(payment_date)
    .execute(&mut *conn)
    .await?;

    Ok(Payment {
        id: result.last_insert_rowid(),
        transaction_id,
        amount,
        payment_date,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
