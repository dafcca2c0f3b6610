use crate::{
    constants::{FIRST_GREAT_PROPHET_ID, LAST_GREAT_PROPHET_ID},
    error::InventoryError,
    utils::format_weth,
};
use alloy_primitives::{utils::parse_ether, U256};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet};
use tracing::info;

/// One entry of the prophets JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProphetRecord {
    /// The token id.
    pub id: u64,
    /// The floor price in ether, e.g. `"12.5"`.
    pub floor_price: String,
    /// The BABL attached to the prophet, in ether units. Zero when the file has no `babl`.
    #[serde(default, with = "crate::utils::ether_amount")]
    pub babl: U256,
}

/// A great prophet up for auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// The token id, within `FIRST_GREAT_PROPHET_ID..=LAST_GREAT_PROPHET_ID`.
    pub id: u64,
    /// The lowest price the item can clear at, in wei.
    pub floor_price: U256,
}

impl InventoryItem {
    /// Parses a prophet record, converting its floor price from ether to wei.
    pub fn from_record(record: &ProphetRecord) -> Result<Self, InventoryError> {
        let floor_price: U256 =
            parse_ether(record.floor_price.trim()).map_err(|_| InventoryError::InvalidFloorPrice {
                id: record.id,
                price: record.floor_price.clone(),
            })?;

        Ok(Self {
            id: record.id,
            floor_price,
        })
    }

    /// Items with a higher floor come first, ties broken by ascending id.
    pub fn rank(a: &Self, b: &Self) -> Ordering {
        b.floor_price
            .cmp(&a.floor_price)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// The great prophets still available in a clearing run, ordered by descending floor price.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    /// Validates and sorts `items`.
    ///
    /// # Errors
    ///
    /// * `InventoryError::IdOutOfRange` if an id is not a great prophet.
    /// * `InventoryError::DuplicateId` if an id appears twice.
    pub fn new(mut items: Vec<InventoryItem>) -> Result<Self, InventoryError> {
        let mut seen: BTreeSet<u64> = BTreeSet::new();
        for item in items.iter() {
            if !(FIRST_GREAT_PROPHET_ID..=LAST_GREAT_PROPHET_ID).contains(&item.id) {
                return Err(InventoryError::IdOutOfRange {
                    id: item.id,
                    first: FIRST_GREAT_PROPHET_ID,
                    last: LAST_GREAT_PROPHET_ID,
                });
            }
            if !seen.insert(item.id) {
                return Err(InventoryError::DuplicateId(item.id));
            }
        }

        items.sort_by(InventoryItem::rank);
        Ok(Self { items })
    }

    /// Parses every record, rejecting the whole file on the first invalid one.
    pub fn from_records(records: &[ProphetRecord]) -> Result<Self, InventoryError> {
        let items: Vec<InventoryItem> = records
            .iter()
            .map(InventoryItem::from_record)
            .collect::<Result<_, _>>()?;
        Self::new(items)
    }

    /// Keeps only the great prophets of a full prophets list, as the clearing task does with
    /// the list of all 9000 prophets.
    pub fn greats_from_records(records: &[ProphetRecord]) -> Result<Self, InventoryError> {
        let greats: Vec<ProphetRecord> = records
            .iter()
            .filter(|record: &&ProphetRecord| record.id >= FIRST_GREAT_PROPHET_ID)
            .cloned()
            .collect();
        Self::from_records(&greats)
    }

    /// The remaining items, highest floor first.
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the highest-floor item that a bid of `amount` can afford.
    pub fn best_affordable(&self, amount: &U256) -> Option<usize> {
        self.items
            .iter()
            .position(|item: &InventoryItem| item.floor_price <= *amount)
    }

    /// Takes the item at `index` out of the inventory.
    pub fn take(&mut self, index: usize) -> InventoryItem {
        self.items.remove(index)
    }

    /// Sums the floor prices of the inventory.
    pub fn total_floor(&self) -> U256 {
        self.items
            .iter()
            .fold(U256::ZERO, |acc: U256, item: &InventoryItem| {
                acc.saturating_add(item.floor_price)
            })
    }

    /// Summarizes a full prophets list: the greats count, floor and BABL, and the BABL over
    /// every prophet.
    ///
    /// # Arguments
    ///
    /// * `records` - The prophets list; entries below `FIRST_GREAT_PROPHET_ID` only count towards
    ///   `total_babl`.
    pub fn summarize(records: &[ProphetRecord]) -> Result<InventorySummary, InventoryError> {
        let total_babl: U256 = sum_babl(records.iter());
        let greats_babl: U256 = sum_babl(
            records
                .iter()
                .filter(|record: &&ProphetRecord| record.id >= FIRST_GREAT_PROPHET_ID),
        );
        let greats: Self = Self::greats_from_records(records)?;

        let summary: InventorySummary = InventorySummary {
            count: greats.len(),
            total_floor: greats.total_floor(),
            greats_babl,
            total_babl,
        };
        info!(
            count = summary.count,
            greats_floor = %format_weth(&summary.total_floor),
            greats_babl = %format_weth(&summary.greats_babl),
            total_babl = %format_weth(&summary.total_babl),
            "prophets inventory"
        );
        Ok(summary)
    }
}

fn sum_babl<'a, I: Iterator<Item = &'a ProphetRecord>>(records: I) -> U256 {
    records.fold(U256::ZERO, |acc: U256, record: &ProphetRecord| {
        acc.saturating_add(record.babl)
    })
}

/// Count, floor and BABL totals of a prophets list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    /// Number of great prophets.
    pub count: usize,
    /// Sum of the greats' floor prices, in wei.
    pub total_floor: U256,
    /// BABL attached to the greats, in wei units.
    pub greats_babl: U256,
    /// BABL attached to every prophet, in wei units.
    pub total_babl: U256,
}
