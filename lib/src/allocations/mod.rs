use crate::{
    contracts::IProphetsArrival::mintGreatCall,
    error::BidError,
    inventory::InventoryItem,
    orders::bids::{Bid, BidRecord},
    signing::SplitSignature,
    solvency::Exclusion,
    utils::{format_weth, parse_address},
};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

/// A great prophet awarded to a bid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// The awarded token id.
    pub item_id: u64,
    /// The item's floor price, in wei.
    pub floor_price: U256,
    /// The bidder that wins the item.
    pub winner: Address,
    /// What the winner is charged, in wei. Never above `bid_amount`.
    pub clearing_price: U256,
    /// The signed bid amount, in wei.
    pub bid_amount: U256,
    /// The signed bid nonce.
    pub nonce: U256,
    /// When the winning bid was collected.
    pub inserted_at: u64,
    /// The winning bid's signature, forwarded to `mintGreat`.
    pub signature: SplitSignature,
}

impl Allocation {
    /// Awards `item` to `bid` at `clearing_price`.
    pub fn new(bid: &Bid, item: &InventoryItem, clearing_price: U256) -> Self {
        Self {
            item_id: item.id,
            floor_price: item.floor_price,
            winner: bid.bidder,
            clearing_price,
            bid_amount: bid.amount,
            nonce: bid.nonce,
            inserted_at: bid.inserted_at,
            signature: bid.signature,
        }
    }

    /// Builds the single-item `mintGreat` call redeeming this allocation.
    pub fn mint_call(&self) -> mintGreatCall {
        mintGreatCall {
            _id: U256::from(self.item_id),
            _amount: self.clearing_price,
            _bid: self.bid_amount,
            _nonce: self.nonce,
            v: self.signature.v,
            r: self.signature.r,
            s: self.signature.s,
        }
    }

    /// ABI-encoded calldata of [`Self::mint_call`].
    pub fn mint_calldata(&self) -> Vec<u8> {
        self.mint_call().abi_encode()
    }

    /// Converts the allocation into an entry of the mints file.
    pub fn to_mint_record(&self) -> MintRecord {
        MintRecord {
            bid: BidRecord {
                wallet: self.winner.to_checksum(None),
                amount: self.bid_amount,
                nonce: self.nonce,
                inserted_at: self.inserted_at,
                signature: self.signature.to_hex(),
            },
            id: self.item_id,
            floor_price: self.floor_price,
            second_price: self.clearing_price,
        }
    }

    /// Reads an allocation back from an entry of the mints file.
    pub fn from_mint_record(record: &MintRecord) -> Result<Self, BidError> {
        Ok(Self {
            item_id: record.id,
            floor_price: record.floor_price,
            winner: parse_address(&record.bid.wallet)?,
            clearing_price: record.second_price,
            bid_amount: record.bid.amount,
            nonce: record.bid.nonce,
            inserted_at: record.bid.inserted_at,
            signature: SplitSignature::from_hex(&record.bid.signature)?,
        })
    }
}

/// One entry of the mints file: the winning bid, the awarded prophet and the price to charge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRecord {
    /// The winning bid, as it was collected.
    #[serde(flatten)]
    pub bid: BidRecord,
    /// The awarded prophet id.
    pub id: u64,
    /// The awarded prophet's floor price, written in ether as in the prophets file.
    #[serde(with = "crate::utils::ether_amount")]
    pub floor_price: U256,
    /// The clearing price in wei.
    #[serde(with = "crate::utils::decimal")]
    pub second_price: U256,
}

/// A bid that reached allocation but got no item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unallocated {
    /// The bid.
    pub bid: Bid,
    /// Why no item was awarded.
    pub reason: UnallocatedReason,
}

/// Why a solvent bid did not win anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnallocatedReason {
    /// Every remaining item has a floor above the bid.
    BelowEveryFloor,
    /// The inventory ran out before the bid was reached.
    InventoryExhausted,
}

/// Outcome of a clearing run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClearingResult {
    /// Awarded items, in bid order.
    pub allocations: Vec<Allocation>,
    /// Sum of every clearing price, in wei.
    pub total_proceeds: U256,
    /// Bids dropped by the solvency pre-filter.
    pub excluded: Vec<Exclusion>,
    /// Solvent bids that won nothing.
    pub unallocated: Vec<Unallocated>,
}

impl ClearingResult {
    /// Records an allocation and adds its price to the proceeds.
    pub fn allocate(&mut self, allocation: Allocation) {
        self.total_proceeds = self.total_proceeds.saturating_add(allocation.clearing_price);
        self.allocations.push(allocation);
    }

    /// The mints file content for this run.
    pub fn mint_records(&self) -> Vec<MintRecord> {
        self.allocations
            .iter()
            .map(Allocation::to_mint_record)
            .collect()
    }

    /// Total proceeds formatted in WETH.
    pub fn total_proceeds_weth(&self) -> String {
        format_weth(&self.total_proceeds)
    }
}
