//! # Validation Module
//!
//! Input validation for everything a caller can hand the store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (pure, before any SQL runs)                      │
//! │  ├── Required names, PIN format                                        │
//! │  └── Sign checks on prices, costs, quantities, payments                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repositories (inside the SQLite transaction)                 │
//! │  ├── Referenced rows exist, lot belongs to product                     │
//! │  └── Stock / credit / payment rules (see `ledger`)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL, UNIQUE(pin_hash)                                        │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::{Money, Quantity};
use crate::types::{NewClient, NewProduct, NewTransaction};
use crate::MAX_TRANSACTION_ITEMS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MIN_PIN_LENGTH: usize = 4;
pub const MAX_PIN_LENGTH: usize = 12;
const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (user, product, client, stock group).
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_name;
///
/// assert!(validate_name("name", "Widget").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a PIN before it is stored.
///
/// ## Rules
/// - 4 to 12 characters
/// - ASCII digits only
///
/// `authenticate` does not call this: a malformed PIN simply matches nobody.
pub fn validate_pin(pin: &str) -> ValidationResult<()> {
    let len = pin.len();
    if !(MIN_PIN_LENGTH..=MAX_PIN_LENGTH).contains(&len) {
        return Err(ValidationError::OutOfRange {
            field: "pin length".to_string(),
            min: MIN_PIN_LENGTH as i64,
            max: MAX_PIN_LENGTH as i64,
        });
    }

    if !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "pin".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Zero is allowed (free items, donated stock).
pub fn validate_non_negative_money(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a quantity that moves stock. Must be > 0.
pub fn validate_quantity(qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a payment amount. Must be > 0.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_non_negative_money("price", product.price)
}

pub fn validate_new_client(client: &NewClient) -> ValidationResult<()> {
    validate_name("name", &client.name)?;
    validate_non_negative_money("credit_limit", client.credit_limit)
}

/// Shape checks on a transaction request. Row existence and stock levels
/// are checked later, inside the database transaction.
///
/// ## Rules
/// - 1 to `MAX_TRANSACTION_ITEMS` items
/// - every item quantity > 0, every price override >= 0
/// - every payment > 0
pub fn validate_new_transaction(request: &NewTransaction) -> ValidationResult<()> {
    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if request.items.len() > MAX_TRANSACTION_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_TRANSACTION_ITEMS as i64,
        });
    }

    for item in &request.items {
        validate_quantity(item.quantity)?;
        if let Some(price) = item.price {
            validate_non_negative_money("price", price)?;
        }
        if let Some(group) = &item.stock_group {
            validate_name("stock_group", group)?;
        }
    }

    for amount in &request.payments {
        validate_payment_amount(*amount)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewTransactionItem, TransactionType};

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Widget").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_pin() {
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("000000000000").is_ok());

        assert!(validate_pin("123").is_err());
        assert!(validate_pin("12a4").is_err());
        assert!(validate_pin("1234567890123").is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_non_negative_money("price", Money::zero()).is_ok());
        assert!(validate_non_negative_money("price", Money::from_cents(-1)).is_err());

        assert!(validate_quantity(Quantity::from_milli(1)).is_ok());
        assert!(validate_quantity(Quantity::zero()).is_err());

        assert!(validate_payment_amount(Money::from_cents(1)).is_ok());
        assert_eq!(
            validate_payment_amount(Money::zero()),
            Err(ValidationError::MustBePositive {
                field: "payment amount".to_string()
            })
        );
    }

    #[test]
    fn test_validate_new_transaction() {
        let empty = NewTransaction::new(TransactionType::Sale);
        assert!(validate_new_transaction(&empty).is_err());

        let ok = NewTransaction::new(TransactionType::Sale)
            .item(NewTransactionItem::new(1, Quantity::from_units(1)));
        assert!(validate_new_transaction(&ok).is_ok());

        let zero_qty = NewTransaction::new(TransactionType::Sale)
            .item(NewTransactionItem::new(1, Quantity::zero()));
        assert!(validate_new_transaction(&zero_qty).is_err());

        let negative_price = NewTransaction::new(TransactionType::Sale).item(
            NewTransactionItem::new(1, Quantity::from_units(1)).at_price(Money::from_cents(-5)),
        );
        assert!(validate_new_transaction(&negative_price).is_err());

        let zero_payment = ok.clone().payment(Money::zero());
        assert!(validate_new_transaction(&zero_payment).is_err());
    }
}
