//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Components and Their Repositories                    │
//! │                                                                         │
//! │  Identity Store        UserRepository                                  │
//! │  ├── find_by_id / authenticate / login                                 │
//! │  └── create_user / change_pin                                          │
//! │                                                                         │
//! │  Inventory Ledger      ProductRepository + StockRepository             │
//! │  ├── create_product / get_by_id / get_by_barcode / list                │
//! │  └── receive_stock / reserve_and_deduct / restock / list_for_product   │
//! │                                                                         │
//! │  Clients               ClientRepository                                │
//! │  └── create_client / get_by_id / outstanding_balance                   │
//! │                                                                         │
//! │  Transaction Engine    TransactionRepository                           │
//! │  ├── commit (items + stock moves + payments, all or nothing)           │
//! │  └── record_payment                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statements that must run inside a caller's SQLite transaction are plain
//! functions taking `&mut SqliteConnection`; the repository methods wrap
//! them in their own transaction when called on their own.

pub mod client;
pub mod product;
pub mod stock;
pub mod transaction;
pub mod user;
