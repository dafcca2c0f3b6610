use alloy_primitives::U256;
use tracing::debug;

use crate::{
    allocations::{Allocation, ClearingResult, Unallocated, UnallocatedReason},
    inventory::{Inventory, InventoryItem},
    orders::bids::ValidatedBids,
    utils::format_weth,
};

use super::Assignable;

impl Assignable for ValidatedBids {
    fn assign(self, inventory: &mut Inventory, result: &mut ClearingResult) {
        let mut bids = self.into_iter().peekable();

        while let Some(bid) = bids.next() {
            if inventory.is_empty() {
                debug!(bidder = %bid.bidder, "no prophets left for the bid");
                result.unallocated.push(Unallocated {
                    bid,
                    reason: UnallocatedReason::InventoryExhausted,
                });
                continue;
            }

            // Highest floor the bid still covers
            let index: usize = match inventory.best_affordable(&bid.amount) {
                Some(index) => index,
                None => {
                    debug!(
                        bidder = %bid.bidder,
                        amount = %format_weth(&bid.amount),
                        "bid is below every remaining floor"
                    );
                    result.unallocated.push(Unallocated {
                        bid,
                        reason: UnallocatedReason::BelowEveryFloor,
                    });
                    continue;
                }
            };

            let floor: U256 = inventory.items()[index].floor_price;
            // The next bid sets the price only when it also clears the floor
            let next_bid: Option<U256> = bids
                .peek()
                .map(|next| next.amount)
                .filter(|amount: &U256| *amount >= floor);
            let clearing_price: U256 = next_bid.unwrap_or(floor);

            let item: InventoryItem = inventory.take(index);
            debug!(
                bidder = %bid.bidder,
                amount = %format_weth(&bid.amount),
                prophet = item.id,
                floor = %format_weth(&item.floor_price),
                price = %format_weth(&clearing_price),
                second_bid = next_bid.is_some(),
                "resolved bid"
            );
            result.allocate(Allocation::new(&bid, &item, clearing_price));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{bids::tests::random_bid, bids::Bid, ValidatedOrders};
    use alloy_primitives::utils::parse_ether;

    #[test]
    fn test_assign_bids_second_price() {
        let mut inventory: Inventory =
            Inventory::new(vec![item(8001, "5"), item(8002, "2")]).unwrap();
        let mut bids: ValidatedBids = vec![bid("4"), bid("9"), bid("3")];
        bids.sort_orders();

        let mut result: ClearingResult = ClearingResult::default();
        bids.assign(&mut inventory, &mut result);

        // 9 takes the 5 floor item, 4 is below that floor so the floor is paid
        assert_eq!(result.allocations[0].item_id, 8001);
        assert_eq!(result.allocations[0].clearing_price, ether("5"));
        // 4 takes the 2 floor item, 3 clears that floor and sets the price
        assert_eq!(result.allocations[1].item_id, 8002);
        assert_eq!(result.allocations[1].clearing_price, ether("3"));
        assert_eq!(result.unallocated.len(), 1);
        assert_eq!(
            result.unallocated[0].reason,
            UnallocatedReason::InventoryExhausted
        );
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_assign_bids_skips_unaffordable() {
        let mut inventory: Inventory = Inventory::new(vec![item(8001, "5")]).unwrap();
        let bids: ValidatedBids = vec![bid("1")];

        let mut result: ClearingResult = ClearingResult::default();
        bids.assign(&mut inventory, &mut result);

        assert!(result.allocations.is_empty());
        assert_eq!(
            result.unallocated[0].reason,
            UnallocatedReason::BelowEveryFloor
        );
        assert_eq!(inventory.len(), 1);
    }

    #[test]
    fn test_assign_bids_last_bid_pays_floor() {
        let mut inventory: Inventory = Inventory::new(vec![item(8001, "1")]).unwrap();
        let bids: ValidatedBids = vec![bid("7")];

        let mut result: ClearingResult = ClearingResult::default();
        bids.assign(&mut inventory, &mut result);

        assert_eq!(result.allocations[0].clearing_price, ether("1"));
        assert_eq!(result.total_proceeds, ether("1"));
    }

    // HELPER FUNCTIONS
    fn ether(amount: &str) -> U256 {
        parse_ether(amount).unwrap()
    }

    fn item(id: u64, floor: &str) -> InventoryItem {
        InventoryItem {
            id,
            floor_price: ether(floor),
        }
    }

    fn bid(amount: &str) -> Bid {
        let mut bid: Bid = random_bid();
        bid.amount = ether(amount);
        bid
    }
}
