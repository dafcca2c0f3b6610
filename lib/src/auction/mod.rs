pub mod assign_bids;


use alloy_primitives::Address;
use tracing::info;

use crate::{
    allocations::ClearingResult,
    error::ClearingError,
    inventory::Inventory,
    orders::{bids::ValidatedBids, ValidatedOrders},
    solvency::{filter_solvent, BalanceOracle, RetryPolicy, SolvencyOutcome},
};

/// Trait for orders that can be resolved against the remaining inventory.
pub trait Assignable {
    /// Walks the orders from most to least competitive, awarding each the best item it affords.
    ///
    /// # Arguments
    ///
    /// * `self` - The sorted, solvent orders.
    /// * `inventory` - The items still available; awarded items are removed from it.
    /// * `result` - The clearing result the allocations and dead ends are recorded into.
    fn assign(self, inventory: &mut Inventory, result: &mut ClearingResult);
}

/// Clears the great prophets auction.
///
/// Bids are sorted by amount (earlier bids win ties), insolvent ones are dropped, and the rest
/// are resolved greedily: each bid takes the highest-floor item it covers and pays the next bid's
/// amount if that also covers the floor, the floor price otherwise.
///
/// # Arguments
///
/// * `bids` - The verified bids, in any order.
/// * `inventory` - The great prophets up for auction.
/// * `oracle` - Point-in-time WETH balances and allowances.
/// * `arrival` - The contract that pulls the payments.
/// * `retry` - How transient oracle failures are retried.
///
/// # Returns
///
/// The allocations with the total proceeds, the insolvent bids and the bids that won nothing.
/// The result only depends on the content of the inputs, never on their order.
pub fn clear<O: BalanceOracle + ?Sized>(
    mut bids: ValidatedBids,
    mut inventory: Inventory,
    oracle: &O,
    arrival: &Address,
    retry: &RetryPolicy,
) -> Result<ClearingResult, ClearingError> {
    info!(bids = bids.len(), prophets = inventory.len(), "clearing auction");

    // Sorting first makes the solvency filter deterministic too
    bids.sort_orders();
    let SolvencyOutcome { solvent, excluded } = filter_solvent(bids, oracle, arrival, retry)?;

    let mut result: ClearingResult = ClearingResult {
        excluded,
        ..Default::default()
    };
    solvent.assign(&mut inventory, &mut result);

    info!(
        allocated = result.allocations.len(),
        excluded = result.excluded.len(),
        unallocated = result.unallocated.len(),
        prophets_left = inventory.len(),
        "total amount {} WETH",
        result.total_proceeds_weth()
    );
    Ok(result)
}
