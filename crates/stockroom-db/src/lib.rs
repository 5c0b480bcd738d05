//! # stockroom-db: Database Layer for Stockroom
//!
//! Persistent store for the back office: users, catalogue, stock lots,
//! clients and transactions, on SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Host application (desktop shell, CLI, seed binary)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ UserRepo       │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo    │   │ 001_initial_ │  │   │
//! │  │   │ Write gate    │    │ StockRepo      │   │ schema.sql   │  │   │
//! │  │   │               │    │ ClientRepo     │   │ + bootstrap  │  │   │
//! │  │   │               │    │ TransactionRepo│   │   admin      │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │          ▲                                                      │   │
//! │  │          │ Settings (stockroom.toml + STOCKROOM_* env)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, write gate, repository accessors
//! - [`settings`] - Layered configuration
//! - [`migrations`] - Embedded schema and bootstrap user
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, Settings};
//! use stockroom_core::{NewTransaction, NewTransactionItem, Quantity, TransactionType};
//!
//! let db = Database::new(Settings::load()?.db_config()).await?;
//!
//! let login = db.users().login("1234").await;
//!
//! let sale = NewTransaction::new(TransactionType::Sale)
//!     .item(NewTransactionItem::new(product_id, Quantity::from_units(2)));
//! let committed = db.transactions().commit(sale).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod settings;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use settings::Settings;

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::product::ProductRepository;
pub use repository::stock::StockRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::user::{LoginResponse, UserRepository};
