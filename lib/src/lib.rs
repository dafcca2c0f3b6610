pub mod allocations;
pub mod auction;
pub mod batch;
pub mod constants;
pub mod contracts;
pub mod error;
pub mod inventory;
pub mod orders;
pub mod signing;
pub mod solvency;
pub mod utils;
pub mod whitelist;

use alloy_primitives::Address;
pub use allocations::{Allocation, ClearingResult, MintRecord};
pub use batch::{build_batches, BatchConfig, MintGreatBatch};
pub use error::ClearingError;
pub use inventory::{Inventory, ProphetRecord};
pub use orders::bids::{Bid, BidBook, BidRecord, RejectedBid};
pub use signing::{BidSigner, SplitSignature};
pub use solvency::{BalanceOracle, BalanceRecord, RetryPolicy, SnapshotOracle};
pub use whitelist::{Whitelist, WhitelistEntry, WhitelistTiers};

use tracing::info;

/// Runs the great prophets auction over file snapshots.
///
/// Bids whose signature does not match or whose nonce was already used are logged and left out.
/// Only the great prophets of `prophets` are put up for auction.
///
/// # Arguments
///
/// * `arrival` - The `ProphetsArrival` contract the bids were signed for.
/// * `bids` - The collected bid records.
/// * `prophets` - The prophets list, either the greats alone or all of them.
/// * `balances` - The WETH balances and allowances towards `arrival`.
/// * `retry` - How transient oracle failures are retried.
///
/// # Returns
///
/// The `ClearingResult` of the run, or the first input error.
pub fn run_clearing(
    arrival: &Address,
    bids: &[BidRecord],
    prophets: &[ProphetRecord],
    balances: &[BalanceRecord],
    retry: &RetryPolicy,
) -> Result<ClearingResult, ClearingError> {
    info!("got {} bids", bids.len());

    let mut book: BidBook = BidBook::new(*arrival);
    let rejected: Vec<RejectedBid> = book.load(bids)?;
    if !rejected.is_empty() {
        info!(rejected = rejected.len(), "left out bids with invalid signatures or nonces");
    }

    let inventory: Inventory = Inventory::greats_from_records(prophets)?;
    let oracle: SnapshotOracle = SnapshotOracle::new(*arrival, balances);

    auction::clear(book.into_bids(), inventory, &oracle, arrival, retry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{utils::parse_ether, U256};
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn test_run_clearing() {
        let arrival: Address = Address::random();
        let alice: PrivateKeySigner = PrivateKeySigner::random();
        let bob: PrivateKeySigner = PrivateKeySigner::random();

        let alice_bid: Bid = signed(&alice, &arrival, "3", 1, 10);
        let bob_bid: Bid = signed(&bob, &arrival, "2", 1, 20);
        // Replayed nonce, dropped before clearing
        let alice_replay: Bid = signed(&alice, &arrival, "5", 1, 30);

        let bids: Vec<BidRecord> = vec![
            bob_bid.to_record(),
            alice_bid.to_record(),
            alice_replay.to_record(),
        ];
        let prophets: Vec<ProphetRecord> = vec![
            ProphetRecord {
                id: 8000,
                floor_price: "0.1".to_string(),
                babl: U256::ZERO,
            },
            ProphetRecord {
                id: 8001,
                floor_price: "1".to_string(),
                babl: U256::ZERO,
            },
        ];
        let balances: Vec<BalanceRecord> = [&alice_bid, &bob_bid]
            .iter()
            .map(|bid: &&Bid| BalanceRecord {
                owner: bid.bidder,
                balance: parse_ether("10").unwrap(),
                allowance: parse_ether("10").unwrap(),
            })
            .collect();

        let result: ClearingResult = run_clearing(
            &arrival,
            &bids,
            &prophets,
            &balances,
            &RetryPolicy::default(),
        )
        .unwrap();

        assert_eq!(result.allocations.len(), 1);
        assert_eq!(result.allocations[0].item_id, 8001);
        assert_eq!(result.allocations[0].winner, alice_bid.bidder);
        assert_eq!(result.allocations[0].clearing_price, parse_ether("2").unwrap());
        assert_eq!(result.unallocated.len(), 1);
    }

    #[test]
    fn test_run_clearing_rejects_bad_inventory() {
        let prophets: Vec<ProphetRecord> = vec![ProphetRecord {
            id: 9001,
            floor_price: "1".to_string(),
            babl: U256::ZERO,
        }];

        assert!(matches!(
            run_clearing(
                &Address::random(),
                &[],
                &prophets,
                &[],
                &RetryPolicy::default()
            ),
            Err(ClearingError::Inventory(_))
        ));
    }

    // HELPER FUNCTIONS
    fn signed(
        signer: &PrivateKeySigner,
        arrival: &Address,
        amount: &str,
        nonce: u64,
        inserted_at: u64,
    ) -> Bid {
        Bid::signed(
            signer,
            arrival,
            parse_ether(amount).unwrap(),
            U256::from(nonce),
            inserted_at,
        )
        .unwrap()
    }
}
