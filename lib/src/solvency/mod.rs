//! Solvency pre-filter: bids are only kept while the bidder's WETH balance and allowance towards
//! the arrival contract cover every bid of theirs kept so far.
use crate::{
    constants::DEFAULT_ORACLE_ATTEMPTS, error::OracleError, orders::bids::Bid, utils::format_weth,
};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Read-only, point-in-time view of the payment token.
pub trait BalanceOracle {
    /// The token balance of `owner`.
    fn balance_of(&self, owner: &Address) -> Result<U256, OracleError>;

    /// The amount `spender` may transfer on behalf of `owner`.
    fn allowance(&self, owner: &Address, spender: &Address) -> Result<U256, OracleError>;
}

/// One entry of the balances snapshot file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// The token holder.
    pub owner: Address,
    /// Its WETH balance in wei.
    pub balance: U256,
    /// Its WETH allowance towards the arrival contract, in wei.
    pub allowance: U256,
}

/// A [`BalanceOracle`] answering from a snapshot taken against a single spender.
///
/// Accounts missing from the snapshot hold nothing, and allowances towards any other spender
/// are zero.
#[derive(Clone, Debug, Default)]
pub struct SnapshotOracle {
    spender: Address,
    accounts: BTreeMap<Address, (U256, U256)>,
}

impl SnapshotOracle {
    /// Indexes `records`, whose allowances were read for `spender`.
    pub fn new(spender: Address, records: &[BalanceRecord]) -> Self {
        Self {
            spender,
            accounts: records
                .iter()
                .map(|record: &BalanceRecord| (record.owner, (record.balance, record.allowance)))
                .collect(),
        }
    }
}

impl BalanceOracle for SnapshotOracle {
    fn balance_of(&self, owner: &Address) -> Result<U256, OracleError> {
        Ok(self
            .accounts
            .get(owner)
            .map_or(U256::ZERO, |(balance, _)| *balance))
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Result<U256, OracleError> {
        if *spender != self.spender {
            return Ok(U256::ZERO);
        }
        Ok(self
            .accounts
            .get(owner)
            .map_or(U256::ZERO, |(_, allowance)| *allowance))
    }
}

/// How many times an oracle query is attempted before the run is aborted.
///
/// Only transient failures are retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, at least one is always made.
    pub attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ORACLE_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Runs `query`, retrying it while it fails with a transient error and attempts remain.
    pub fn run<T, Q>(&self, mut query: Q) -> Result<T, OracleError>
    where
        Q: FnMut() -> Result<T, OracleError>,
    {
        let attempts: usize = self.attempts.max(1);
        let mut attempt: usize = 1;
        loop {
            match query() {
                Err(error) if error.is_transient() && attempt < attempts => {
                    warn!(attempt, attempts, %error, "retrying oracle query");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// A bid dropped by the solvency pre-filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exclusion {
    /// The dropped bid.
    pub bid: Bid,
    /// The bidder's balance.
    pub balance: U256,
    /// The bidder's allowance towards the arrival contract.
    pub allowance: U256,
    /// The amount already committed by the bidder's better bids.
    pub committed: U256,
}

/// Outcome of [`filter_solvent`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolvencyOutcome {
    /// The bids that stay in the auction, in their input order.
    pub solvent: Vec<Bid>,
    /// The dropped bids, in their input order.
    pub excluded: Vec<Exclusion>,
}

/// Drops every bid its bidder cannot pay for.
///
/// Bids are walked in the given order, which must already be the clearing order, keeping a running
/// per-bidder total of kept bids. A bid is kept if both the balance and the allowance towards
/// `arrival` cover that total plus its amount.
///
/// # Arguments
///
/// * `bids` - The bids, sorted from most to least competitive.
/// * `oracle` - The balance and allowance source.
/// * `arrival` - The contract that will pull the payments.
/// * `retry` - How transient oracle failures are retried.
///
/// # Returns
///
/// The kept and dropped bids, or the oracle error once retries are exhausted. An oracle failure is
/// never taken as a lack of funds.
pub fn filter_solvent<O: BalanceOracle + ?Sized>(
    bids: Vec<Bid>,
    oracle: &O,
    arrival: &Address,
    retry: &RetryPolicy,
) -> Result<SolvencyOutcome, OracleError> {
    let total: usize = bids.len();
    let mut funds: BTreeMap<Address, (U256, U256)> = BTreeMap::new();
    let mut committed: BTreeMap<Address, U256> = BTreeMap::new();
    let mut outcome: SolvencyOutcome = SolvencyOutcome::default();

    for bid in bids.into_iter() {
        // Each bidder is queried once per run
        let (balance, allowance) = match funds.get(&bid.bidder) {
            Some(known) => *known,
            None => {
                let balance: U256 = retry.run(|| oracle.balance_of(&bid.bidder))?;
                let allowance: U256 = retry.run(|| oracle.allowance(&bid.bidder, arrival))?;
                funds.insert(bid.bidder, (balance, allowance));
                (balance, allowance)
            }
        };

        let already: U256 = committed.get(&bid.bidder).copied().unwrap_or(U256::ZERO);
        let needed: U256 = already.saturating_add(bid.amount);

        if balance >= needed && allowance >= needed {
            committed.insert(bid.bidder, needed);
            outcome.solvent.push(bid);
        } else {
            warn!(
                bidder = %bid.bidder,
                bid = %format_weth(&bid.amount),
                committed = %format_weth(&already),
                balance = %format_weth(&balance),
                allowance = %format_weth(&allowance),
                "bid plus the bidder's other bids is not covered, removing it"
            );
            outcome.excluded.push(Exclusion {
                bid,
                balance,
                allowance,
                committed: already,
            });
        }
    }

    info!(
        total,
        removed = outcome.excluded.len(),
        "removed bids without enough WETH"
    );
    Ok(outcome)
}
