//! # Ledger Rules
//!
//! The arithmetic the transaction engine applies before anything is written.
//!
//! ## Payment State Machine
//! ```text
//!                 payment (Σ < total)
//!              ┌──────────────────────┐
//!              ▼                      │
//!  commit ──► UNPAID ─────────────────┘
//!    │          │
//!    │          │ payment (Σ == total)
//!    │          ▼
//!    └──────► PAID  (terminal: any further payment is an overpayment)
//!  (Σ == total at commit, including zero-total transactions)
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Quantity};
use crate::validation::validate_payment_amount;

/// Line total for one item: `price × quantity`, rounded to the cent.
///
/// Refuses amounts past the i64 cent range instead of wrapping.
#[inline]
pub fn line_total(price: Money, quantity: Quantity) -> CoreResult<Money> {
    price.times(quantity).ok_or_else(|| amount_out_of_range("line total"))
}

/// Transaction total: exact sum of the rounded line totals.
///
/// Rounding happens per line, so the stored `total_amount` always equals the
/// sum a report would compute from `transaction_items`.
///
/// ## Example
/// ```rust
/// use stockroom_core::ledger::transaction_total;
/// use stockroom_core::{Money, Quantity};
///
/// let total = transaction_total([
///     (Money::from_cents(199), Quantity::from_milli(333)), // 66¢
///     (Money::from_cents(199), Quantity::from_milli(333)), // 66¢
/// ]);
/// assert_eq!(total.unwrap().cents(), 132);
/// ```
pub fn transaction_total<I>(lines: I) -> CoreResult<Money>
where
    I: IntoIterator<Item = (Money, Quantity)>,
{
    lines.into_iter().try_fold(Money::zero(), |total, (price, quantity)| {
        total
            .checked_add(line_total(price, quantity)?)
            .ok_or_else(|| amount_out_of_range("total"))
    })
}

fn amount_out_of_range(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

/// `is_paid` for a transaction.
#[inline]
pub fn is_settled(total: Money, paid: Money) -> bool {
    paid >= total
}

/// Checks that `amount` may be added to `paid_so_far` and returns the new
/// cumulative amount.
///
/// ## Rules
/// - amount > 0
/// - `paid_so_far + amount <= total`
pub fn accept_payment(
    transaction_id: Option<i64>,
    total: Money,
    paid_so_far: Money,
    amount: Money,
) -> CoreResult<Money> {
    validate_payment_amount(amount)?;

    match paid_so_far.checked_add(amount) {
        Some(paid) if paid <= total => Ok(paid),
        _ => Err(CoreError::Overpayment {
            transaction_id,
            total,
            paid: paid_so_far,
            attempted: amount,
        }),
    }
}

/// Sums payments taken at commit time, checking each one in turn.
pub fn accept_payments(total: Money, amounts: &[Money]) -> CoreResult<Money> {
    amounts
        .iter()
        .try_fold(Money::zero(), |paid, amount| accept_payment(None, total, paid, *amount))
}

/// Checks that booking `additional` unpaid money on a client keeps its
/// outstanding balance within the credit limit.
///
/// A zero `additional` always passes: a fully paid transaction never needs
/// credit, even for a client already over its limit.
pub fn check_credit(
    client_id: i64,
    credit_limit: Money,
    balance: Money,
    additional: Money,
) -> CoreResult<()> {
    if !additional.is_positive() {
        return Ok(());
    }

    let within_limit = balance
        .checked_add(additional)
        .is_some_and(|owed| owed <= credit_limit);

    if !within_limit {
        return Err(CoreError::CreditLimitExceeded {
            client_id,
            credit_limit,
            balance,
            requested: additional,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_total_is_sum_of_rounded_lines() {
        let lines = [
            (cents(250), Quantity::from_units(4)),
            (cents(199), Quantity::from_milli(333)),
            (cents(0), Quantity::from_units(9)),
        ];
        let expected: Money = lines.iter().filter_map(|(p, q)| p.times(*q)).sum();
        assert_eq!(transaction_total(lines), Ok(expected));
        assert_eq!(expected.cents(), 1000 + 66);
    }

    #[test]
    fn test_total_past_i64_is_rejected_not_wrapped() {
        // one line too large on its own
        let err = transaction_total([(cents(i64::MAX), Quantity::from_units(2))]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "line total"
        ));

        // two lines that fit alone but not together
        let half = cents(i64::MAX / 2 + 1);
        let err = transaction_total([
            (half, Quantity::from_units(1)),
            (half, Quantity::from_units(1)),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "total"
        ));
    }

    #[test]
    fn test_payment_up_to_total_is_accepted() {
        let paid = accept_payment(Some(1), cents(1000), cents(400), cents(600)).unwrap();
        assert_eq!(paid, cents(1000));
        assert!(is_settled(cents(1000), paid));
    }

    #[test]
    fn test_payment_past_total_is_rejected() {
        let err = accept_payment(Some(1), cents(1000), cents(400), cents(601)).unwrap_err();
        assert_eq!(
            err,
            CoreError::Overpayment {
                transaction_id: Some(1),
                total: cents(1000),
                paid: cents(400),
                attempted: cents(601),
            }
        );
    }

    #[test]
    fn test_payment_past_i64_is_an_overpayment() {
        let err = accept_payment(Some(1), cents(i64::MAX), cents(i64::MAX - 1), cents(2)).unwrap_err();
        assert!(matches!(err, CoreError::Overpayment { .. }));
    }

    #[test]
    fn test_any_payment_on_settled_transaction_is_rejected() {
        assert!(accept_payment(Some(1), cents(500), cents(500), cents(1)).is_err());
    }

    #[test]
    fn test_zero_payment_is_a_validation_error() {
        let err = accept_payment(Some(1), cents(500), cents(0), cents(0)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_accept_payments_sums_and_caps() {
        assert_eq!(accept_payments(cents(1000), &[cents(300), cents(700)]).unwrap(), cents(1000));
        assert_eq!(accept_payments(cents(1000), &[]).unwrap(), cents(0));
        assert!(accept_payments(cents(1000), &[cents(600), cents(600)]).is_err());
    }

    #[test]
    fn test_credit_check() {
        // limit 100, balance 90: 10 fits, 20 doesn't
        assert!(check_credit(1, cents(10_000), cents(9_000), cents(1_000)).is_ok());
        assert!(matches!(
            check_credit(1, cents(10_000), cents(9_000), cents(2_000)),
            Err(CoreError::CreditLimitExceeded { .. })
        ));
        // fully paid transactions never need credit
        assert!(check_credit(1, cents(0), cents(5_000), cents(0)).is_ok());
        // a balance that cannot be represented is never within the limit
        assert!(matches!(
            check_credit(1, cents(i64::MAX), cents(i64::MAX), cents(1)),
            Err(CoreError::CreditLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_zero_total_is_settled_immediately() {
        assert!(is_settled(cents(0), cents(0)));
        assert!(!is_settled(cents(1), cents(0)));
    }
}
