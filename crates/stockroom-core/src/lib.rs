//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds the inventory and ledger rules of the store as pure
//! functions with zero I/O dependencies. The database crate calls into it
//! for every number it writes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Caller (back-office UI, scripts)             │   │
//! │  │    login ──► receive stock ──► commit transaction ──► payment   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ allocation │  │  ledger   │  │   │
//! │  │   │  Product  │  │   Money   │  │  FIFO lots │  │  totals   │  │   │
//! │  │   │   Stock   │  │ Quantity  │  │            │  │  credit   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockroom-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (User, Product, Stock, Client, Transaction, ...)
//! - [`money`] - Money and Quantity with integer arithmetic (no floating point!)
//! - [`ledger`] - Line totals, payment acceptance, credit limit checks
//! - [`allocation`] - Oldest-lot-first stock allocation
//! - [`auth`] - PIN digest and the bootstrap credential
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::{Money, Quantity};
//!
//! let price = Money::from_cents(250);         // $2.50
//! let qty = Quantity::from_milli(1_500);      // 1.5 units
//! assert_eq!(price.times(qty), Some(Money::from_cents(375)));  // $3.75
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod auth;
pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Quantity};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock group assigned to lots received through a purchase transaction
/// when the item doesn't name one.
pub const DEFAULT_PURCHASE_GROUP: &str = "purchase";

/// Maximum line items accepted in a single transaction request.
pub const MAX_TRANSACTION_ITEMS: usize = 200;
