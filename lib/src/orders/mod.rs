pub mod bids;

use std::cmp::Ordering;

/// Trait for the orders that reach clearing after ingestion.
pub trait ValidatedOrders {
    type Order;

    /// Compares two orders by competitiveness, the most competitive first.
    ///
    /// Must be a total order so that sorting is reproducible for any input permutation.
    fn rank(a: &Self::Order, b: &Self::Order) -> Ordering;

    /// Sorts the orders from most to least competitive.
    ///
    /// # Arguments
    ///
    /// * `self` - The orders being sorted.
    fn sort_orders(&mut self);
}
