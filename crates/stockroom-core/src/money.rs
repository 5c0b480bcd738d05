//! # Money and Quantity
//!
//! Fixed-point value types for every amount the store persists.
//!
//! ## Why Integers?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 + 0.2 = 0.30000000000000004  ❌ a ledger can't drift like that     │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units                                      │
//! │    Money    → cents          1099  = $10.99                             │
//! │    Quantity → thousandths    2_500 = 2.5 units (kg, litres, ...)        │
//! │                                                                         │
//! │  price × quantity = cents × thousandths / 1000, rounded ONCE per line  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::{Money, Quantity};
//!
//! let price = Money::from_cents(1099);
//! let line = price.times(Quantity::from_units(3)).unwrap();
//! assert_eq!(line.cents(), 3297);
//!
//! // Amounts that no longer fit in i64 cents are refused, never wrapped.
//! assert_eq!(Money::from_cents(i64::MAX).times(Quantity::from_units(2)), None);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

/// Thousandths per whole unit of [`Quantity`].
pub const MILLI_PER_UNIT: i64 = 1_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences such as `limit - balance` may go negative
/// - **Single field tuple struct**: zero-cost over i64, stored as INTEGER
///
/// ## Where Money is Used
/// ```text
/// products.price ──► transaction_items.price ──► line total ──┐
/// stock.cost_price ─────────────────────────────────────────────┤
///                                                               ▼
///        clients.credit_limit ◄── balance check ── transactions.total_amount
///                                                               ▲
///                                            payments.amount ───┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `self + other`, or `None` past the i64 range.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `self - other`, floored at zero.
    #[inline]
    pub const fn saturating_remainder(&self, other: Money) -> Money {
        if self.0 > other.0 {
            Money(self.0 - other.0)
        } else {
            Money(0)
        }
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// ## Rounding
    /// `cents × thousandths` is exact in i128; the division by 1000 rounds
    /// half away from zero, once, to the cent. `None` when the rounded
    /// result does not fit in i64 cents.
    ///
    /// ```text
    /// $1.99 × 0.333 = 66.267¢  → 66¢
    /// $0.01 × 0.500 =  0.5¢    →  1¢
    /// $2.00 × 4.000 = 800¢     → 800¢ (whole quantities never round)
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::{Money, Quantity};
    ///
    /// let line = Money::from_cents(199).times(Quantity::from_milli(333));
    /// assert_eq!(line, Some(Money::from_cents(66)));
    /// ```
    pub fn times(&self, qty: Quantity) -> Option<Money> {
        let product = self.0 as i128 * qty.milli() as i128;
        let half = (MILLI_PER_UNIT / 2) as i128;
        let rounded = if product >= 0 {
            (product + half) / MILLI_PER_UNIT as i128
        } else {
            (product - half) / MILLI_PER_UNIT as i128
        };
        i64::try_from(rounded).ok().map(Money)
    }
}

/// Display shows dollars, for logs and error messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Quantity Type
// =============================================================================

/// A stock quantity in thousandths of a unit.
///
/// Lots hold fractional amounts (bulk goods sold by weight), so the store
/// keeps three decimal places. `Quantity::from_units(6)` and
/// `Quantity::from_milli(6_000)` are the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    /// Raw thousandths, as stored in the `quantity` columns.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn min(self, other: Quantity) -> Quantity {
        Quantity(self.0.min(other.0))
    }
}

/// Display with three decimals: `6.000`, `0.250`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(
            f,
            "{}{}.{:03}",
            sign,
            abs / MILLI_PER_UNIT,
            abs % MILLI_PER_UNIT
        )
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Saturates at `i64::MAX` thousandths, which is only ever compared
/// against a requested amount.
impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, qty| Quantity(acc.0.saturating_add(qty.0)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");

        assert_eq!(Quantity::from_units(6).to_string(), "6.000");
        assert_eq!(Quantity::from_milli(250).to_string(), "0.250");
        assert_eq!(Quantity::from_milli(-1_500).to_string(), "-1.500");
    }

    #[test]
    fn test_times_whole_quantities_are_exact() {
        let price = Money::from_cents(299);
        assert_eq!(price.times(Quantity::from_units(3)), Some(Money::from_cents(897)));
        assert_eq!(price.times(Quantity::zero()), Some(Money::zero()));
    }

    #[test]
    fn test_times_rounds_half_away_from_zero() {
        let cents = |c: i64, milli: i64| Money::from_cents(c).times(Quantity::from_milli(milli)).map(|m| m.cents());
        // 1¢ × 0.5 = 0.5¢ → 1¢
        assert_eq!(cents(1, 500), Some(1));
        // 1¢ × 0.499 = 0.499¢ → 0¢
        assert_eq!(cents(1, 499), Some(0));
        // -1¢ × 0.5 → -1¢
        assert_eq!(cents(-1, 500), Some(-1));
        // $1.99 × 0.333 = 66.267¢ → 66¢
        assert_eq!(cents(199, 333), Some(66));
    }

    #[test]
    fn test_times_large_values_do_not_overflow() {
        let price = Money::from_cents(i64::MAX / 1_000);
        assert_eq!(price.times(Quantity::from_units(1)), Some(price));
    }

    #[test]
    fn test_times_refuses_results_past_i64() {
        let price = Money::from_cents(i64::MAX);
        assert_eq!(price.times(Quantity::from_units(1)), Some(price));
        assert_eq!(price.times(Quantity::from_units(2)), None);
        assert_eq!(Money::from_cents(i64::MIN).times(Quantity::from_units(2)), None);
    }

    #[test]
    fn test_checked_add() {
        assert_eq!(
            Money::from_cents(100).checked_add(Money::from_cents(250)),
            Some(Money::from_cents(350))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_sums() {
        let total: Money = [Money::from_cents(100), Money::from_cents(250)].iter().sum();
        assert_eq!(total.cents(), 350);

        let qty: Quantity = vec![Quantity::from_units(1), Quantity::from_milli(500)]
            .into_iter()
            .sum();
        assert_eq!(qty.milli(), 1_500);

        let huge: Quantity = [Quantity::from_milli(i64::MAX), Quantity::from_units(1)]
            .into_iter()
            .sum();
        assert_eq!(huge.milli(), i64::MAX);
    }

    #[test]
    fn test_saturating_remainder() {
        let total = Money::from_cents(1000);
        assert_eq!(total.saturating_remainder(Money::from_cents(400)).cents(), 600);
        assert_eq!(total.saturating_remainder(Money::from_cents(1500)).cents(), 0);
    }

    #[test]
    fn test_serializes_as_plain_integers() {
        let json = serde_json::to_string(&(Money::from_cents(1099), Quantity::from_milli(250))).unwrap();
        assert_eq!(json, "[1099,250]");
    }
}
