use super::ValidatedOrders;
use crate::{
    error::{BidError, SigningError},
    signing::{verify_bid, BidSigner, SplitSignature},
    utils::parse_address,
};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet};
use tracing::{debug, warn};

/// A signed bid as collected off-chain, one entry of the bids JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRecord {
    /// The bidder's wallet.
    pub wallet: String,
    /// The bid amount in wei.
    #[serde(with = "crate::utils::decimal")]
    pub amount: U256,
    /// The bidder's single-use nonce.
    #[serde(with = "crate::utils::decimal")]
    pub nonce: U256,
    /// Unix timestamp at which the bid was collected; earlier wins ties.
    pub inserted_at: u64,
    /// The 65-byte signature over the bid digest, hex encoded.
    pub signature: String,
}

/// A parsed bid for a great prophet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bid {
    /// The address the signature must recover to.
    pub bidder: Address,
    /// The arrival contract the bid is redeemable at.
    pub arrival: Address,
    /// The bid amount in wei, the most the bidder accepts to pay.
    pub amount: U256,
    /// The bidder's single-use nonce.
    pub nonce: U256,
    /// Unix timestamp at which the bid was collected.
    pub inserted_at: u64,
    /// The bid signature.
    pub signature: SplitSignature,
}

impl Bid {
    /// Parses a bid record addressed to `arrival`.
    ///
    /// Only the shape of the record is checked here; the signature is verified when the bid is
    /// submitted to a [`BidBook`].
    pub fn from_record(record: &BidRecord, arrival: &Address) -> Result<Self, BidError> {
        Ok(Self {
            bidder: parse_address(&record.wallet)?,
            arrival: *arrival,
            amount: record.amount,
            nonce: record.nonce,
            inserted_at: record.inserted_at,
            signature: SplitSignature::from_hex(&record.signature)?,
        })
    }

    /// Creates a bid signed by `signer`.
    pub fn signed<S: BidSigner>(
        signer: &S,
        arrival: &Address,
        amount: U256,
        nonce: U256,
        inserted_at: u64,
    ) -> Result<Self, SigningError> {
        Ok(Self {
            bidder: signer.address(),
            arrival: *arrival,
            amount,
            nonce,
            inserted_at,
            signature: signer.sign_bid(arrival, &amount, &nonce)?,
        })
    }

    /// Converts the bid back into its file representation.
    pub fn to_record(&self) -> BidRecord {
        BidRecord {
            wallet: self.bidder.to_checksum(None),
            amount: self.amount,
            nonce: self.nonce,
            inserted_at: self.inserted_at,
            signature: self.signature.to_hex(),
        }
    }

    /// Checks that the bid was signed by its bidder for its arrival contract.
    pub fn verify_signature(&self) -> Result<(), SigningError> {
        verify_bid(
            &self.bidder,
            &self.arrival,
            &self.amount,
            &self.nonce,
            &self.signature,
        )
    }
}

/// A bid that was refused by the [`BidBook`].
#[derive(Debug)]
pub struct RejectedBid {
    /// The refused record.
    pub record: BidRecord,
    /// Why it was refused.
    pub error: BidError,
}

/// The set of accepted bids for one arrival contract, with replay protection.
///
/// Every `(bidder, nonce)` pair is accepted at most once. Nonces already consumed on-chain can
/// be fed in with [`BidBook::with_consumed_nonces`] so that stale bids are refused too.
#[derive(Clone, Debug, Default)]
pub struct BidBook {
    arrival: Address,
    consumed: BTreeSet<(Address, U256)>,
    bids: ValidatedBids,
}

impl BidBook {
    /// Creates an empty book for bids redeemable at `arrival`.
    pub fn new(arrival: Address) -> Self {
        Self {
            arrival,
            ..Default::default()
        }
    }

    /// Marks the given `(bidder, nonce)` pairs as already consumed.
    pub fn with_consumed_nonces<I>(mut self, consumed: I) -> Self
    where
        I: IntoIterator<Item = (Address, U256)>,
    {
        self.consumed.extend(consumed);
        self
    }

    /// The arrival contract the book accepts bids for.
    pub const fn arrival(&self) -> &Address {
        &self.arrival
    }

    /// Returns true if `nonce` of `bidder` can no longer be used.
    pub fn is_consumed(&self, bidder: &Address, nonce: &U256) -> bool {
        self.consumed.contains(&(*bidder, *nonce))
    }

    /// Accepts a bid if its signature recovers to the bidder over this book's arrival contract and
    /// its nonce was not used before.
    ///
    /// # Errors
    ///
    /// * `BidError::Signature` with `InvalidSignature` if the signature does not match.
    /// * `BidError::NonceAlreadyUsed` if the `(bidder, nonce)` pair was consumed already.
    pub fn submit(&mut self, mut bid: Bid) -> Result<(), BidError> {
        bid.arrival = self.arrival;
        bid.verify_signature()?;

        if !self.consumed.insert((bid.bidder, bid.nonce)) {
            return Err(BidError::NonceAlreadyUsed {
                bidder: bid.bidder,
                nonce: bid.nonce,
            });
        }

        debug!(bidder = %bid.bidder, nonce = %bid.nonce, amount = %bid.amount, "accepted bid");
        self.bids.push(bid);
        Ok(())
    }

    /// Parses and submits every record.
    ///
    /// Malformed records (bad wallet or signature encoding) reject the whole input. Bids that
    /// are well formed but refused, for a wrong signer or a replayed nonce, are logged and
    /// returned.
    pub fn load(&mut self, records: &[BidRecord]) -> Result<Vec<RejectedBid>, BidError> {
        let bids: Vec<Bid> = records
            .iter()
            .map(|record: &BidRecord| Bid::from_record(record, &self.arrival))
            .collect::<Result<_, _>>()?;

        let mut rejected: Vec<RejectedBid> = Vec::new();
        for (bid, record) in bids.into_iter().zip(records) {
            if let Err(error) = self.submit(bid) {
                warn!(wallet = %record.wallet, nonce = %record.nonce, %error, "rejected bid");
                rejected.push(RejectedBid {
                    record: record.clone(),
                    error,
                });
            }
        }

        Ok(rejected)
    }

    /// The accepted bids, in submission order.
    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    /// Consumes the book, returning the accepted bids.
    pub fn into_bids(self) -> ValidatedBids {
        self.bids
    }
}

/// A collection of bids that passed signature and replay checks.
pub type ValidatedBids = Vec<Bid>;

impl ValidatedOrders for ValidatedBids {
    type Order = Bid;

    /// Higher amounts first, then earlier `inserted_at`; bidder and nonce break any remaining tie.
    fn rank(a: &Bid, b: &Bid) -> Ordering {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.inserted_at.cmp(&b.inserted_at))
            .then_with(|| a.bidder.cmp(&b.bidder))
            .then_with(|| a.nonce.cmp(&b.nonce))
    }

    fn sort_orders(&mut self) {
        self.sort_by(Self::rank);
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn test_bid_record_json_shape() {
        let json = r#"{
            "wallet": "0x1111111111111111111111111111111111111111",
            "amount": "1500000000000000000",
            "nonce": "0x2a",
            "insertedAt": 1637366400,
            "signature": "0x00"
        }"#;
        let record: BidRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.amount, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(record.nonce, U256::from(42u64));
        assert_eq!(record.inserted_at, 1_637_366_400);
    }

    #[test]
    fn test_record_round_trip_through_book() {
        let signer: PrivateKeySigner = PrivateKeySigner::random();
        let arrival: Address = Address::random();
        let bid: Bid = Bid::signed(&signer, &arrival, U256::from(5u64), U256::from(1u64), 10)
            .unwrap();

        assert_eq!(Bid::from_record(&bid.to_record(), &arrival).unwrap(), bid);
    }

    #[test]
    fn test_submit_accepts_valid_bid() {
        let signer: PrivateKeySigner = PrivateKeySigner::random();
        let arrival: Address = Address::random();
        let mut book: BidBook = BidBook::new(arrival);

        book.submit(random_signed_bid(&signer, &arrival)).unwrap();
        assert_eq!(book.bids().len(), 1);
    }

    #[test]
    fn test_submit_rejects_reused_nonce() {
        let signer: PrivateKeySigner = PrivateKeySigner::random();
        let arrival: Address = Address::random();
        let mut book: BidBook = BidBook::new(arrival);
        let bid: Bid = random_signed_bid(&signer, &arrival);

        book.submit(bid.clone()).unwrap();
        let error: BidError = book.submit(bid.clone()).unwrap_err();
        assert!(matches!(
            error,
            BidError::NonceAlreadyUsed { bidder, nonce } if bidder == bid.bidder && nonce == bid.nonce
        ));
        assert_eq!(book.bids().len(), 1);

        // Same nonce, different amount: still a replay
        let higher: Bid = Bid::signed(
            &signer,
            &arrival,
            bid.amount + U256::from(1u64),
            bid.nonce,
            bid.inserted_at + 1,
        )
        .unwrap();
        assert!(matches!(
            book.submit(higher),
            Err(BidError::NonceAlreadyUsed { .. })
        ));
    }

    #[test]
    fn test_submit_rejects_nonce_consumed_onchain() {
        let signer: PrivateKeySigner = PrivateKeySigner::random();
        let arrival: Address = Address::random();
        let bid: Bid = random_signed_bid(&signer, &arrival);
        let mut book: BidBook =
            BidBook::new(arrival).with_consumed_nonces([(bid.bidder, bid.nonce)]);

        assert!(book.is_consumed(&bid.bidder, &bid.nonce));
        assert!(matches!(
            book.submit(bid),
            Err(BidError::NonceAlreadyUsed { .. })
        ));
    }

    #[test]
    fn test_submit_rejects_foreign_signature() {
        let signer: PrivateKeySigner = PrivateKeySigner::random();
        let arrival: Address = Address::random();
        let mut book: BidBook = BidBook::new(arrival);

        // Claims to come from someone else
        let mut forged: Bid = random_signed_bid(&signer, &arrival);
        forged.bidder = Address::random();
        assert!(matches!(
            book.submit(forged),
            Err(BidError::Signature(SigningError::InvalidSignature { .. }))
        ));

        // Signed for another arrival contract
        let elsewhere: Bid = random_signed_bid(&signer, &Address::random());
        assert!(matches!(
            book.submit(elsewhere),
            Err(BidError::Signature(SigningError::InvalidSignature { .. }))
        ));

        // A rejected signature does not burn the nonce
        assert!(book.bids().is_empty());
        assert!(book.consumed.is_empty());
    }

    #[test]
    fn test_load_collects_rejections() {
        let signer: PrivateKeySigner = PrivateKeySigner::random();
        let arrival: Address = Address::random();
        let bid: Bid = random_signed_bid(&signer, &arrival);
        let records: Vec<BidRecord> = vec![
            bid.to_record(),
            bid.to_record(),
            random_signed_bid(&signer, &arrival).to_record(),
        ];

        let mut book: BidBook = BidBook::new(arrival);
        let rejected: Vec<RejectedBid> = book.load(&records).unwrap();

        assert_eq!(book.bids().len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].record, records[1]);
        assert!(!rejected[0].error.is_input_error());
    }

    #[test]
    fn test_load_fails_fast_on_malformed_record() {
        let signer: PrivateKeySigner = PrivateKeySigner::random();
        let arrival: Address = Address::random();
        let mut malformed: BidRecord = random_signed_bid(&signer, &arrival).to_record();
        malformed.wallet = "0xnope".to_string();
        let records: Vec<BidRecord> = vec![
            random_signed_bid(&signer, &arrival).to_record(),
            malformed,
        ];

        let mut book: BidBook = BidBook::new(arrival);
        let error: BidError = book.load(&records).unwrap_err();
        assert!(error.is_input_error());
        assert!(book.bids().is_empty());
    }

    #[test]
    fn test_validated_bids_sort_orders() {
        let mut bids: ValidatedBids = (0..32).map(|_| random_bid()).collect();
        bids.sort_orders();

        for pair in bids.windows(2) {
            assert!(pair[0].amount >= pair[1].amount);
            if pair[0].amount == pair[1].amount {
                assert!(pair[0].inserted_at <= pair[1].inserted_at);
            }
        }
    }

    #[test]
    fn test_sort_breaks_amount_ties_by_insertion_time() {
        let mut early: Bid = random_bid();
        early.amount = U256::from(10u64);
        early.inserted_at = 100;
        let mut late: Bid = early.clone();
        late.bidder = Address::random();
        late.inserted_at = 200;

        let mut bids: ValidatedBids = vec![late.clone(), early.clone()];
        bids.sort_orders();
        assert_eq!(bids, vec![early, late]);
    }

    #[test]
    fn test_sort_is_permutation_independent() {
        let mut bids: ValidatedBids = (0..16)
            .map(|i| {
                let mut bid: Bid = random_bid();
                // Force plenty of full amount and timestamp ties
                bid.amount = U256::from(i % 3);
                bid.inserted_at = i % 2;
                bid
            })
            .collect();
        let mut reversed: ValidatedBids = bids.iter().rev().cloned().collect();

        bids.sort_orders();
        reversed.sort_orders();
        assert_eq!(bids, reversed);
    }

    // HELPER FUNCTIONS
    /// Creates a bid with random values and a dummy signature.
    pub fn random_bid() -> Bid {
        Bid {
            bidder: Address::random(),
            arrival: Address::random(),
            amount: U256::from(rand::random::<u64>() % 1_000),
            nonce: U256::from(rand::random::<u64>()),
            inserted_at: rand::random::<u64>() % 1_000,
            signature: SplitSignature {
                v: 27,
                r: Default::default(),
                s: Default::default(),
            },
        }
    }

    /// Creates a bid properly signed by `signer` for `arrival`.
    pub fn random_signed_bid(signer: &PrivateKeySigner, arrival: &Address) -> Bid {
        Bid::signed(
            signer,
            arrival,
            U256::from(rand::random::<u64>()),
            U256::from(rand::random::<u64>()),
            rand::random::<u32>() as u64,
        )
        .unwrap()
    }
}
