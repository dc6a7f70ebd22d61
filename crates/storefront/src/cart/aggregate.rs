//! Derived cart aggregates.

use eazika_core::Price;
use serde::Serialize;

use super::view::CartView;

/// Count and total derived from the current cart view.
///
/// Only [`AggregateState::compute`] produces values; there is no setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateState {
    count: usize,
    total_amount: Price,
}

impl AggregateState {
    /// Aggregates of an empty cart.
    pub const EMPTY: Self = Self {
        count: 0,
        total_amount: Price::ZERO,
    };

    /// Recompute from the joined collection.
    ///
    /// `count` is the number of distinct line items, not the sum of quantities.
    /// Unknown products contribute zero to the total.
    #[must_use]
    pub fn compute(views: &[CartView]) -> Self {
        Self {
            count: views.len(),
            total_amount: views.iter().map(CartView::line_total).sum(),
        }
    }

    /// Number of distinct line items.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub const fn total_amount(&self) -> Price {
        self.total_amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::view::join;
    use crate::cart::view::tests::{catalog, line_item};

    #[test]
    fn test_count_is_distinct_items_not_quantity() {
        let items = vec![line_item(1, 1, 2), line_item(2, 2, 1), line_item(3, 3, 5)];
        let aggregate = AggregateState::compute(&join(&items, &catalog(&[])));
        assert_eq!(aggregate.count(), 3);
    }

    #[test]
    fn test_total_sums_price_times_quantity() {
        let items = vec![line_item(1, 10, 2), line_item(2, 20, 1)];
        let aggregate = AggregateState::compute(&join(&items, &catalog(&[(10, 50), (20, 100)])));
        assert_eq!(aggregate.count(), 2);
        assert_eq!(aggregate.total_amount(), Price::from_units(200));
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let items = vec![line_item(1, 10, 2), line_item(2, 404, 7)];
        let aggregate = AggregateState::compute(&join(&items, &catalog(&[(10, 50)])));
        assert_eq!(aggregate.count(), 2);
        assert_eq!(aggregate.total_amount(), Price::from_units(100));
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(AggregateState::compute(&[]), AggregateState::EMPTY);
        assert_eq!(AggregateState::default(), AggregateState::EMPTY);
    }
}
