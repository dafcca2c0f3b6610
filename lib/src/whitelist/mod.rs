//! Merkle whitelists: one sorted-pair tree per minting round, committed on-chain by its root.
use crate::{
    contracts::IProphetsArrival::{addUsersToWhitelistCall, mintProphetCall},
    error::WhitelistError,
    utils::{hash_address, parse_address},
};
use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use sorted_merkle::{verify_proof, SortedMerkleTree};

/// One entry of a whitelist tier file.
///
/// Tier files are flat JSON arrays of `{ "address": "0x…" }` objects; bare address strings are
/// accepted as well.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhitelistEntry {
    /// `{ "address": "0x…" }`
    Object {
        /// The whitelisted address.
        address: String,
    },
    /// `"0x…"`
    Bare(String),
}

impl WhitelistEntry {
    /// Returns the raw address string of the entry.
    pub fn address(&self) -> &str {
        match self {
            Self::Object { address } => address,
            Self::Bare(address) => address,
        }
    }
}

/// A snapshot of the addresses eligible in one round, committed to by a sorted-pair Merkle root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Whitelist {
    tree: SortedMerkleTree,
}

impl Whitelist {
    /// Builds the whitelist tree over `addresses`.
    ///
    /// The root does not depend on the order of `addresses`, and duplicated addresses share a
    /// single leaf.
    pub fn new(addresses: &[Address]) -> Self {
        let leaves: Vec<B256> = addresses.iter().map(hash_address).collect();
        Self {
            tree: SortedMerkleTree::new(&leaves),
        }
    }

    /// Parses every entry and builds the whitelist, rejecting the whole list on the first
    /// malformed address.
    pub fn from_entries(entries: &[WhitelistEntry]) -> Result<Self, WhitelistError> {
        let addresses: Vec<Address> = entries
            .iter()
            .map(|entry: &WhitelistEntry| parse_address(entry.address()))
            .collect::<Result<_, _>>()?;
        Ok(Self::new(&addresses))
    }

    /// The commitment published on-chain. Zero for an empty whitelist.
    pub fn root(&self) -> B256 {
        self.tree.root()
    }

    /// Number of distinct whitelisted addresses.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if nobody is whitelisted.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns `true` if `address` is whitelisted.
    pub fn contains(&self, address: &Address) -> bool {
        self.tree.has(&hash_address(address))
    }

    /// Returns the sibling path proving that `address` is whitelisted.
    pub fn proof(&self, address: &Address) -> Result<Vec<B256>, WhitelistError> {
        self.tree
            .proof_for(&hash_address(address))
            .map(|proof| proof.siblings)
            .ok_or(WhitelistError::AddressNotFound(*address))
    }

    /// Builds the `mintProphet` call `address` must send to mint with its proof.
    pub fn mint_call(&self, address: &Address) -> Result<mintProphetCall, WhitelistError> {
        Ok(mintProphetCall {
            _proof: self.proof(address)?,
        })
    }
}

/// Checks `proof` for `address` against `root` the way the on-chain verifier does.
pub fn verify(root: &B256, proof: &[B256], address: &Address) -> bool {
    verify_proof(root, &hash_address(address), proof)
}

/// The three whitelisted rounds of the prophets launch.
#[derive(Clone, Debug, Default)]
pub struct WhitelistTiers {
    /// Settlers mint for free.
    pub settlers: Whitelist,
    /// Addresses allowed in the first paid round.
    pub firsts: Whitelist,
    /// Addresses allowed in the second paid round.
    pub seconds: Whitelist,
}

impl WhitelistTiers {
    /// Returns the `addUsersToWhitelist` call publishing the three roots.
    pub fn add_users_call(&self) -> addUsersToWhitelistCall {
        addUsersToWhitelistCall {
            _settlerRoot: self.settlers.root(),
            _firstRoot: self.firsts.root(),
            _secondRoot: self.seconds.root(),
        }
    }

    /// ABI-encoded calldata of [`Self::add_users_call`].
    pub fn calldata(&self) -> Bytes {
        self.add_users_call().abi_encode().into()
    }
}
