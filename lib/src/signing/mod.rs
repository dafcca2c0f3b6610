//! Bid signatures: the digest a bidder signs, the signer capability and signature recovery.
//!
//! A bid authorizes `ProphetsArrival` to charge `amount` WETH to the bidder for a great prophet.
//! The digest binds the amount and a single-use nonce to the arrival contract address, and is
//! signed with the Ethereum personal-message convention (EIP-191), which is what the contract
//! recomputes through `ECDSA.toEthSignedMessageHash` before `ecrecover`.
use crate::{constants::BID_TYPE_DESCRIPTION, error::SigningError};
use alloy_primitives::{hex, keccak256, Address, PrimitiveSignature, B256, U256};
use alloy_signer::{Signer, SignerSync};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, SolValue};
use serde::{Deserialize, Serialize};

sol! {
    /// The bid payload, laid out as `abi.encode(BID_TYPEHASH, arrival, bid, nonce)`.
    struct BidSigPayload {
        /// `keccak256(BID_TYPE_DESCRIPTION)`
        bytes32 typeHash;
        /// The arrival contract the bid is redeemable at
        address arrival;
        /// The maximum amount of WETH the bidder accepts to pay
        uint256 bid;
        /// Single-use value preventing replays of the signature
        uint256 nonce;
    }
}

/// Returns the bid type hash, `keccak256("Bid(uint256 _bid,uin256 _nonce)")`.
pub fn bid_typehash() -> B256 {
    keccak256(BID_TYPE_DESCRIPTION)
}

/// Computes the digest a bidder signs for `(arrival, bid, nonce)`.
///
/// # Arguments
///
/// * `arrival` - The verifying contract, so a signature cannot be replayed against another deployment.
/// * `bid` - The bid amount in wei.
/// * `nonce` - The bidder's single-use nonce.
///
/// # Returns
///
/// `keccak256(abi.encode(BID_TYPEHASH, arrival, bid, nonce))`. This is the message that gets
/// wrapped with the personal-message prefix and signed, not the final signed hash itself.
pub fn bid_sig_hash(arrival: &Address, bid: &U256, nonce: &U256) -> B256 {
    let payload: BidSigPayload = BidSigPayload {
        typeHash: bid_typehash(),
        arrival: *arrival,
        bid: *bid,
        nonce: *nonce,
    };
    keccak256(payload.abi_encode())
}

/// A 65-byte ECDSA signature decomposed the way the contract consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitSignature {
    /// Recovery id, always 27 or 28.
    pub v: u8,
    /// The `r` value.
    pub r: B256,
    /// The `s` value.
    pub s: B256,
}

impl SplitSignature {
    /// Splits a raw `r ‖ s ‖ v` signature.
    ///
    /// A `v` of 0 or 1 is normalized to 27 or 28.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        if bytes.len() != 65 {
            return Err(SigningError::MalformedSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let v: u8 = match bytes[64] {
            v @ (0 | 1) => v + 27,
            v @ (27 | 28) => v,
            v => {
                return Err(SigningError::MalformedSignature(format!(
                    "invalid recovery id {v}"
                )))
            }
        };

        Ok(Self {
            v,
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
        })
    }

    /// Parses and splits a hex-encoded signature, with or without the `0x` prefix.
    pub fn from_hex(signature: &str) -> Result<Self, SigningError> {
        let bytes: Vec<u8> = hex::decode(signature.trim())
            .map_err(|e| SigningError::MalformedSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Returns the joined `r ‖ s ‖ v` form.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(self.r.as_slice());
        bytes[32..64].copy_from_slice(self.s.as_slice());
        bytes[64] = self.v;
        bytes
    }

    /// Returns the joined signature as `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(self.to_bytes())
    }

    /// Recovers the address that signed `digest` as a personal message.
    pub fn recover(&self, digest: &B256) -> Result<Address, SigningError> {
        let signature: PrimitiveSignature = PrimitiveSignature::try_from(&self.to_bytes()[..])
            .map_err(|e| SigningError::MalformedSignature(e.to_string()))?;
        signature
            .recover_address_from_msg(digest.as_slice())
            .map_err(|e| SigningError::MalformedSignature(e.to_string()))
    }
}

/// The capability to sign bids on behalf of one bidder.
pub trait BidSigner {
    /// The address every produced signature recovers to.
    fn address(&self) -> Address;

    /// Signs the bid digest of `(arrival, bid, nonce)` as a personal message.
    fn sign_bid(
        &self,
        arrival: &Address,
        bid: &U256,
        nonce: &U256,
    ) -> Result<SplitSignature, SigningError>;
}

impl BidSigner for PrivateKeySigner {
    fn address(&self) -> Address {
        <Self as Signer>::address(self)
    }

    fn sign_bid(
        &self,
        arrival: &Address,
        bid: &U256,
        nonce: &U256,
    ) -> Result<SplitSignature, SigningError> {
        let digest: B256 = bid_sig_hash(arrival, bid, nonce);
        let signature: PrimitiveSignature = self.sign_message_sync(digest.as_slice())?;
        SplitSignature::from_bytes(&signature.as_bytes())
    }
}

/// Recovers the signer of a bid.
pub fn recover_bidder(
    arrival: &Address,
    bid: &U256,
    nonce: &U256,
    signature: &SplitSignature,
) -> Result<Address, SigningError> {
    signature.recover(&bid_sig_hash(arrival, bid, nonce))
}

/// Checks that `signature` over `(arrival, bid, nonce)` was produced by `bidder`.
pub fn verify_bid(
    bidder: &Address,
    arrival: &Address,
    bid: &U256,
    nonce: &U256,
    signature: &SplitSignature,
) -> Result<(), SigningError> {
    match recover_bidder(arrival, bid, nonce, signature) {
        Ok(recovered) if recovered == *bidder => Ok(()),
        Ok(recovered) => Err(SigningError::InvalidSignature {
            expected: *bidder,
            recovered: Some(recovered),
        }),
        Err(SigningError::MalformedSignature(_)) => Err(SigningError::InvalidSignature {
            expected: *bidder,
            recovered: None,
        }),
        Err(e) => Err(e),
    }
}
