//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejections carry enough detail for the caller to react: which lot, how
//! much was available, how far over the limit.

use thiserror::Error;

use crate::money::{Money, Quantity};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations. None of these are ever partially applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A lot holds less than the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell 11 from lot #4
    ///      │
    ///      ▼
    /// lot #4 holds 6.000
    ///      │
    ///      ▼
    /// InsufficientStock { stock_id: 4, available: 6.000, requested: 11.000 }
    ///      │
    ///      ▼
    /// whole transaction rolled back, lot still holds 6.000
    /// ```
    #[error("Insufficient stock in lot {stock_id}: available {available}, requested {requested}")]
    InsufficientStock {
        stock_id: i64,
        available: Quantity,
        requested: Quantity,
    },

    /// All lots of a product together hold less than requested.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientProductStock {
        product_id: i64,
        available: Quantity,
        requested: Quantity,
    },

    /// Booking the unpaid remainder would push the client past its limit.
    #[error("Credit limit exceeded for client {client_id}: limit {credit_limit}, balance {balance}, requested {requested}")]
    CreditLimitExceeded {
        client_id: i64,
        credit_limit: Money,
        balance: Money,
        requested: Money,
    },

    /// Payments would add up to more than the transaction total.
    #[error("Payment of {attempted} exceeds the remaining balance of transaction {} (total {total}, paid {paid})", transaction_label(.transaction_id))]
    Overpayment {
        /// `None` while the transaction is still being committed.
        transaction_id: Option<i64>,
        total: Money,
        paid: Money,
        attempted: Money,
    },

    /// An item names a lot that belongs to a different product.
    #[error("Stock lot {stock_id} belongs to product {lot_product_id}, not {product_id}")]
    LotProductMismatch {
        stock_id: i64,
        product_id: i64,
        lot_product_id: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// `#12` for a stored transaction, `in progress` while committing.
fn transaction_label(transaction_id: &Option<i64>) -> String {
    match transaction_id {
        Some(id) => format!("#{id}"),
        None => "in progress".to_string(),
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before anything touches the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            stock_id: 4,
            available: Quantity::from_units(6),
            requested: Quantity::from_units(11),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock in lot 4: available 6.000, requested 11.000"
        );

        let err = CoreError::CreditLimitExceeded {
            client_id: 2,
            credit_limit: Money::from_cents(10_000),
            balance: Money::from_cents(9_000),
            requested: Money::from_cents(2_000),
        };
        assert_eq!(
            err.to_string(),
            "Credit limit exceeded for client 2: limit $100.00, balance $90.00, requested $20.00"
        );

        let err = CoreError::Overpayment {
            transaction_id: Some(12),
            total: Money::from_cents(1_000),
            paid: Money::from_cents(400),
            attempted: Money::from_cents(601),
        };
        assert_eq!(
            err.to_string(),
            "Payment of $6.01 exceeds the remaining balance of transaction #12 (total $10.00, paid $4.00)"
        );

        let err = CoreError::Overpayment {
            transaction_id: None,
            total: Money::from_cents(500),
            paid: Money::zero(),
            attempted: Money::from_cents(700),
        };
        assert_eq!(
            err.to_string(),
            "Payment of $7.00 exceeds the remaining balance of transaction in progress (total $5.00, paid $0.00)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        };
        assert_eq!(err.to_string(), "price must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "items".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
