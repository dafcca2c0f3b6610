//! Shapes allocations into the parallel arrays `batchMintGreat` takes.
use crate::{
    allocations::Allocation,
    constants::{DEFAULT_MINT_BATCH_SIZE, MAX_MINT_BATCH_SIZE},
    contracts::IProphetsArrival::batchMintGreatCall,
    error::BatchError,
};
use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use tracing::info;

/// How allocations are chunked into transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Allocations per batch.
    pub batch_size: usize,
    /// Ceiling on the length of every batch array.
    pub max_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_MINT_BATCH_SIZE,
            max_batch_size: MAX_MINT_BATCH_SIZE,
        }
    }
}

impl BatchConfig {
    /// A configuration with the given batch size and the default ceiling.
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Default::default()
        }
    }

    /// Checks the batch size against the ceiling.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.batch_size == 0 {
            return Err(BatchError::ZeroBatchSize);
        }
        if self.batch_size > self.max_batch_size {
            return Err(BatchError::BatchSizeExceeded {
                size: self.batch_size,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }
}

/// The arguments of one `batchMintGreat` call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintGreatBatch {
    /// Prophet ids.
    pub ids: Vec<U256>,
    /// Clearing prices, charged to the winners.
    pub amounts: Vec<U256>,
    /// Signed bid amounts.
    pub bids: Vec<U256>,
    /// Signed bid nonces.
    pub nonces: Vec<U256>,
    /// Signature recovery ids.
    pub v: Vec<u8>,
    /// Signature `r` values.
    pub r: Vec<B256>,
    /// Signature `s` values.
    pub s: Vec<B256>,
}

impl MintGreatBatch {
    /// Lays out `allocations` as parallel arrays.
    pub fn from_allocations(allocations: &[Allocation]) -> Self {
        let mut batch: Self = Self::default();
        for allocation in allocations.iter() {
            batch.ids.push(U256::from(allocation.item_id));
            batch.amounts.push(allocation.clearing_price);
            batch.bids.push(allocation.bid_amount);
            batch.nonces.push(allocation.nonce);
            batch.v.push(allocation.signature.v);
            batch.r.push(allocation.signature.r);
            batch.s.push(allocation.signature.s);
        }
        batch
    }

    /// Number of allocations in the batch.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Checks that every array has the same length, at most `max`.
    pub fn validate(&self, max: usize) -> Result<(), BatchError> {
        let lengths: [usize; 7] = [
            self.ids.len(),
            self.amounts.len(),
            self.bids.len(),
            self.nonces.len(),
            self.v.len(),
            self.r.len(),
            self.s.len(),
        ];

        if lengths.iter().any(|length: &usize| *length != lengths[0]) {
            return Err(BatchError::MalformedBatch);
        }
        if lengths[0] > max {
            return Err(BatchError::BatchSizeExceeded {
                size: lengths[0],
                max,
            });
        }
        Ok(())
    }

    /// Builds the `batchMintGreat` call.
    pub fn call(&self) -> batchMintGreatCall {
        batchMintGreatCall {
            _ids: self.ids.clone(),
            _amounts: self.amounts.clone(),
            _bids: self.bids.clone(),
            _nonces: self.nonces.clone(),
            _v: self.v.clone(),
            _r: self.r.clone(),
            _s: self.s.clone(),
        }
    }

    /// ABI-encoded calldata of [`Self::call`].
    pub fn calldata(&self) -> Bytes {
        self.call().abi_encode().into()
    }
}

/// Splits `allocations` into consecutive batches of `config.batch_size`, keeping their order.
///
/// # Errors
///
/// Fails without producing any batch if the configuration or any batch is invalid.
pub fn build_batches(
    allocations: &[Allocation],
    config: &BatchConfig,
) -> Result<Vec<MintGreatBatch>, BatchError> {
    config.validate()?;

    let batches: Vec<MintGreatBatch> = allocations
        .chunks(config.batch_size)
        .map(MintGreatBatch::from_allocations)
        .collect();
    for batch in batches.iter() {
        batch.validate(config.max_batch_size)?;
    }

    info!(
        allocations = allocations.len(),
        batches = batches.len(),
        batch_size = config.batch_size,
        "built mint batches"
    );
    Ok(batches)
}
