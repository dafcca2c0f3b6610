//! This module contains constants used throughout the project.

/// Structural description of a bid, hashed into the bid type hash.
///
/// Must match the `BID_TYPEHASH` preimage of the deployed `ProphetsArrival` byte for byte,
/// including its `uin256` spelling, or every recovered signer will differ.
pub const BID_TYPE_DESCRIPTION: &str = "Bid(uint256 _bid,uin256 _nonce)";

/// Number of regular prophets; great prophet ids start right after them
pub const PROPHETS_NUM: u64 = 8_000;

/// Number of great prophets sold through the sealed-bid auction
pub const GREAT_PROPHETS_NUM: u64 = 1_000;

/// First valid great prophet id
pub const FIRST_GREAT_PROPHET_ID: u64 = PROPHETS_NUM + 1;

/// Last valid great prophet id
pub const LAST_GREAT_PROPHET_ID: u64 = PROPHETS_NUM + GREAT_PROPHETS_NUM;

/// Default number of allocations redeemed per `batchMintGreat` call
pub const DEFAULT_MINT_BATCH_SIZE: usize = 10;

/// Hard ceiling on the length of any array passed to `batchMintGreat`
pub const MAX_MINT_BATCH_SIZE: usize = 10;

/// Default number of attempts for a balance or allowance query that timed out
pub const DEFAULT_ORACLE_ATTEMPTS: usize = 3;
