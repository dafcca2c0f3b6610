use alloy_primitives::{Address, U256};

/// An error that can occur while parsing whitelist inputs or deriving proofs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WhitelistError {
    /// The input is not a 20-byte hex address.
    #[error("Invalid address format: {0:?}")]
    InvalidAddressFormat(String),
    /// The address has no leaf in the whitelist tree.
    #[error("Address {0} is not part of the whitelist")]
    AddressNotFound(Address),
}

/// An error that can occur when signing a bid or recovering its signer.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The signature is not 65 bytes of valid hex.
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    /// The signature does not recover to the claimed bidder.
    #[error("Invalid signature: expected signer {expected}, recovered {recovered:?}")]
    InvalidSignature {
        /// The bidder the bid claims to come from.
        expected: Address,
        /// The address recovered from the signature, if recovery succeeded at all.
        recovered: Option<Address>,
    },
    /// Error signing the bid hash.
    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),
}

/// An error that can occur when a bid is submitted to the bid book.
#[derive(Debug, thiserror::Error)]
pub enum BidError {
    /// The bid's wallet could not be parsed.
    #[error(transparent)]
    Address(#[from] WhitelistError),
    /// The bid's signature is malformed or does not belong to the bidder.
    #[error(transparent)]
    Signature(#[from] SigningError),
    /// The `(bidder, nonce)` pair was already consumed.
    #[error("Nonce {nonce} already used by {bidder}")]
    NonceAlreadyUsed {
        /// The bidder.
        bidder: Address,
        /// The replayed nonce.
        nonce: U256,
    },
}

impl BidError {
    /// Returns true if the error comes from malformed input rather than a rejected bid.
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Address(_) | Self::Signature(SigningError::MalformedSignature(_))
        )
    }
}

/// An error that can occur while loading the prophets inventory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// The id is outside the great prophets range.
    #[error("Prophet id {id} is out of range, expected {first}..={last}")]
    IdOutOfRange {
        /// The offending id.
        id: u64,
        /// First valid id.
        first: u64,
        /// Last valid id.
        last: u64,
    },
    /// The same id appears twice in the inventory.
    #[error("Prophet id {0} appears more than once")]
    DuplicateId(u64),
    /// The floor price is not a valid ether amount.
    #[error("Invalid floor price {price:?} for prophet {id}")]
    InvalidFloorPrice {
        /// The prophet id.
        id: u64,
        /// The raw floor price.
        price: String,
    },
}

/// An error that can occur when querying the balance/allowance oracle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The query did not answer in time. Transient, the query may be retried.
    #[error("Oracle query for {0} timed out")]
    Timeout(Address),
    /// The oracle failed for a reason that retrying will not fix.
    #[error("Oracle query for {owner} failed: {reason}")]
    Unavailable {
        /// The account that was queried.
        owner: Address,
        /// Description of the failure.
        reason: String,
    },
}

impl OracleError {
    /// Returns true if the query may succeed when retried.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// An error that can occur when shaping allocations into mint batches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    /// A batch size of zero was requested.
    #[error("Batch size must be greater than zero")]
    ZeroBatchSize,
    /// A batch parameter array would exceed the on-chain ceiling.
    #[error("Batch of {size} exceeds the maximum of {max}")]
    BatchSizeExceeded {
        /// The offending length.
        size: usize,
        /// The configured ceiling.
        max: usize,
    },
    /// The parallel arrays of a batch do not have the same length.
    #[error("Batch parameter arrays have mismatched lengths")]
    MalformedBatch,
}

/// An error that aborts a clearing run.
#[derive(Debug, thiserror::Error)]
pub enum ClearingError {
    /// Inventory input was rejected.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    /// A bid or allocation record was rejected.
    #[error(transparent)]
    Bid(#[from] BidError),
    /// The oracle could not be queried, even after retries.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}
