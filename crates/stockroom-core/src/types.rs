//! # Domain Types
//!
//! Records persisted by the store, plus the request shapes callers build.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  User            Product ──1:N──► Stock (lot)                           │
//! │  (pin_hash,         ▲                 ▲                                 │
//! │   role)             │                 │                                 │
//! │                     │                 │                                 │
//! │  Client ──1:N──► Transaction ──1:N──► TransactionItem                   │
//! │  (credit_limit)     │  (type, total,                                    │
//! │                     │   is_paid)                                        │
//! │                     └──────1:N──► Payment                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has an `i64` rowid assigned by SQLite (`AUTOINCREMENT`), so
//! ids are unique and never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Quantity};

// =============================================================================
// User
// =============================================================================

/// Operator role, fixed when the user is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A back-office operator who logs in with a PIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// SHA-256 of the PIN, lowercase hex. Never sent to callers.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub pin_hash: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalogue. Stock lives in [`Stock`] lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Current unit selling price.
    pub price: Money,
    pub barcode: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub barcode: Option<String>,
}

// =============================================================================
// Stock
// =============================================================================

/// A stock lot: one batch of a product with its own acquisition cost.
///
/// ## Lot-Based Costing
/// `cost_price` is fixed when the lot is received. Selling from a lot never
/// averages it with other lots; the cost of goods sold is the cost of the
/// lot the item was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Stock {
    pub id: i64,
    pub product_id: i64,
    /// Free-form label grouping lots (supplier batch, shelf, delivery...).
    pub stock_group: String,
    /// Never negative after a committed adjustment.
    pub quantity: Quantity,
    /// Unit acquisition cost.
    pub cost_price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Client
// =============================================================================

/// A customer (or supplier) that transactions can be booked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
    /// Maximum unpaid balance across all of the client's transactions.
    pub credit_limit: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewClient {
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub credit_limit: Money,
}

// =============================================================================
// Transaction
// =============================================================================

/// What a transaction does to stock.
///
/// | Type         | Stock effect                              |
/// |--------------|-------------------------------------------|
/// | `Sale`       | deducts lots                              |
/// | `Purchase`   | restocks a lot or receives a new one      |
/// | `Adjustment` | deducts lots (write-off, shrinkage)       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Purchase,
    Adjustment,
}

impl TransactionType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Purchase => "purchase",
            TransactionType::Adjustment => "adjustment",
        }
    }

    /// Whether committing this type removes stock from lots.
    #[inline]
    pub const fn consumes_stock(&self) -> bool {
        matches!(self, TransactionType::Sale | TransactionType::Adjustment)
    }

    /// Whether an unpaid remainder is money the client owes the store.
    /// Purchases are owed to the client and adjustments to nobody.
    #[inline]
    pub const fn draws_credit(&self) -> bool {
        matches!(self, TransactionType::Sale)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sale" => Ok(TransactionType::Sale),
            "purchase" => Ok(TransactionType::Purchase),
            "adjustment" => Ok(TransactionType::Adjustment),
            _ => Err(ValidationError::NotAllowed {
                field: "transaction_type".to_string(),
                allowed: vec![
                    "sale".to_string(),
                    "purchase".to_string(),
                    "adjustment".to_string(),
                ],
            }),
        }
    }
}

/// Transaction header.
///
/// Immutable after commit except `is_paid`, which flips to `true` once
/// payments reach `total_amount` and never flips back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: i64,
    pub transaction_type: TransactionType,
    /// `None` for cash / anonymous sales.
    pub client_id: Option<i64>,
    /// Σ line totals of the items.
    pub total_amount: Money,
    pub is_paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line of a transaction, drawn from exactly one lot.
///
/// `price` is frozen at commit time so later price changes don't rewrite
/// history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionItem {
    pub id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    pub stock_id: i64,
    pub quantity: Quantity,
    pub price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A payment towards a transaction. Several partial payments may settle one
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: i64,
    pub transaction_id: i64,
    pub amount: Money,
    #[ts(as = "String")]
    pub payment_date: DateTime<Utc>,
}

// =============================================================================
// Transaction Requests
// =============================================================================

/// One requested line of a new transaction.
///
/// ## Lot and Price Resolution
/// - `stock_id: Some(_)` pins the lot. `None` lets the engine pick: oldest
///   lots first for sales and adjustments, a brand-new lot for purchases.
/// - `price: None` falls back to the product price (sales), the lot cost
///   (adjustments, purchases into an existing lot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransactionItem {
    pub product_id: i64,
    pub stock_id: Option<i64>,
    pub quantity: Quantity,
    pub price: Option<Money>,
    /// Group label for a lot received by a purchase. Ignored otherwise.
    pub stock_group: Option<String>,
}

impl NewTransactionItem {
    /// A line that lets the engine choose the lot and the price.
    pub fn new(product_id: i64, quantity: Quantity) -> Self {
        NewTransactionItem {
            product_id,
            stock_id: None,
            quantity,
            price: None,
            stock_group: None,
        }
    }

    pub fn from_lot(mut self, stock_id: i64) -> Self {
        self.stock_id = Some(stock_id);
        self
    }

    pub fn at_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.stock_group = Some(group.into());
        self
    }
}

/// A complete request for the transaction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub client_id: Option<i64>,
    pub items: Vec<NewTransactionItem>,
    /// Payments taken at the counter together with the transaction.
    pub payments: Vec<Money>,
}

impl NewTransaction {
    pub fn new(transaction_type: TransactionType) -> Self {
        NewTransaction {
            transaction_type,
            client_id: None,
            items: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn for_client(mut self, client_id: i64) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn item(mut self, item: NewTransactionItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn payment(mut self, amount: Money) -> Self {
        self.payments.push(amount);
        self
    }
}

/// What the engine hands back after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommittedTransaction {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
    pub payments: Vec<Payment>,
}

impl CommittedTransaction {
    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
