//! # Lot Allocation
//!
//! Decides which lots service a line when the caller didn't name one.
//!
//! ## Policy: Oldest Lot First
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sell 7.000 Widgets, no lot given                                       │
//! │                                                                         │
//! │  lots (by created_at, id)   qty     take                                │
//! │  ─────────────────────────  ─────   ─────                               │
//! │  #3  group A  @ $2.00       4.000   4.000   ← oldest, drained first     │
//! │  #5  group B  @ $2.10       0.000   skip                                │
//! │  #8  group C  @ $2.40      10.000   3.000                               │
//! │                                                                         │
//! │  → two transaction items: (#3, 4.000) and (#8, 3.000)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The policy is deterministic so cost-of-goods figures are reproducible.
//! The repository is responsible for passing lots in creation order.

use crate::error::{CoreError, CoreResult};
use crate::money::Quantity;

/// What a lot holds right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotBalance {
    pub stock_id: i64,
    pub quantity: Quantity,
}

/// A slice of a line drawn from one lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub stock_id: i64,
    pub quantity: Quantity,
}

/// Splits `requested` over `lots`, oldest first.
///
/// `lots` must already be in creation order. Empty lots are skipped. Fails
/// with [`CoreError::InsufficientProductStock`] when the lots together hold
/// less than requested; nothing is allocated in that case.
///
/// ## Example
/// ```rust
/// use stockroom_core::allocation::{allocate_fifo, LotBalance};
/// use stockroom_core::Quantity;
///
/// let lots = [
///     LotBalance { stock_id: 1, quantity: Quantity::from_units(2) },
///     LotBalance { stock_id: 2, quantity: Quantity::from_units(5) },
/// ];
/// let plan = allocate_fifo(9, &lots, Quantity::from_units(3)).unwrap();
/// assert_eq!(plan.len(), 2);
/// assert_eq!(plan[1].quantity, Quantity::from_units(1));
/// ```
pub fn allocate_fifo(
    product_id: i64,
    lots: &[LotBalance],
    requested: Quantity,
) -> CoreResult<Vec<Allocation>> {
    let available: Quantity = lots
        .iter()
        .filter(|lot| lot.quantity.is_positive())
        .map(|lot| lot.quantity)
        .sum();

    if available < requested {
        return Err(CoreError::InsufficientProductStock {
            product_id,
            available,
            requested,
        });
    }

    let mut remaining = requested;
    let mut plan = Vec::new();

    for lot in lots.iter().filter(|lot| lot.quantity.is_positive()) {
        if remaining.is_zero() {
            break;
        }
        let take = lot.quantity.min(remaining);
        plan.push(Allocation {
            stock_id: lot.stock_id,
            quantity: take,
        });
        remaining -= take;
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(stock_id: i64, units: i64) -> LotBalance {
        LotBalance {
            stock_id,
            quantity: Quantity::from_units(units),
        }
    }

    #[test]
    fn test_single_lot_covers_request() {
        let plan = allocate_fifo(1, &[lot(3, 10)], Quantity::from_units(4)).unwrap();
        assert_eq!(
            plan,
            vec![Allocation {
                stock_id: 3,
                quantity: Quantity::from_units(4)
            }]
        );
    }

    #[test]
    fn test_spills_into_next_lot_and_skips_empty_ones() {
        let lots = [lot(3, 4), lot(5, 0), lot(8, 10)];
        let plan = allocate_fifo(1, &lots, Quantity::from_units(7)).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].stock_id, 3);
        assert_eq!(plan[0].quantity, Quantity::from_units(4));
        assert_eq!(plan[1].stock_id, 8);
        assert_eq!(plan[1].quantity, Quantity::from_units(3));
    }

    #[test]
    fn test_exact_total_drains_everything() {
        let lots = [lot(1, 2), lot(2, 3)];
        let plan = allocate_fifo(1, &lots, Quantity::from_units(5)).unwrap();
        let taken: Quantity = plan.iter().map(|a| a.quantity).sum();
        assert_eq!(taken, Quantity::from_units(5));
    }

    #[test]
    fn test_shortage_reports_product_totals() {
        let lots = [lot(1, 2), lot(2, 3)];
        let err = allocate_fifo(42, &lots, Quantity::from_units(6)).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientProductStock {
                product_id: 42,
                available: Quantity::from_units(5),
                requested: Quantity::from_units(6),
            }
        );
    }

    #[test]
    fn test_no_lots_is_a_shortage() {
        assert!(allocate_fifo(1, &[], Quantity::from_milli(1)).is_err());
    }
}
