//! Bidder tooling: signs a great prophet bid for the arrival contract.
//!
//! You can run this script using the following command:
//! ```shell
//! BIDDER_PRIVATE_KEY=... ARRIVAL_ADDRESS=0x... cargo run --release --bin bid -- --amount 1.5
//! ```

use alloy_primitives::{utils::parse_ether, Address, U256};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Context, Result};
use arrival_lib::{signing::BidSigner, utils::parse_address, Bid, BidRecord};
use clap::Parser;
use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::info;

#[path = "../lib/input.rs"]
mod input;
#[path = "../lib/logger.rs"]
mod logger;

/// The arguments for the command.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The bidder's private key, hex encoded.
    #[clap(long, env = "BIDDER_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// The arrival contract the bid is redeemable at.
    #[clap(long, env = "ARRIVAL_ADDRESS", value_parser = parse_address)]
    arrival: Address,

    /// The bid amount, in WETH.
    #[clap(long)]
    amount: String,

    /// The bid nonce, random when omitted.
    #[clap(long)]
    nonce: Option<u64>,

    /// Appends the signed bid to this bids file instead of printing it.
    #[clap(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Setup the logger.
    logger::setup_logger();

    // Parse the command line arguments.
    let args: Args = Args::parse();

    let signer: PrivateKeySigner = args
        .private_key
        .trim()
        .parse()
        .context("Invalid bidder private key")?;
    let amount: U256 = parse_ether(args.amount.trim())
        .map_err(|e| anyhow!("Invalid bid amount {:?}: {e}", args.amount))?;
    let nonce: U256 = U256::from(args.nonce.unwrap_or_else(rand::random::<u64>));
    let inserted_at: u64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the unix epoch")?
        .as_secs();

    let bid: Bid = Bid::signed(&signer, &args.arrival, amount, nonce, inserted_at)?;
    bid.verify_signature()?;
    info!(
        bidder = %BidSigner::address(&signer),
        arrival = %args.arrival,
        nonce = %nonce,
        "signed bid"
    );

    let record: BidRecord = bid.to_record();
    match args.output {
        Some(path) => {
            let mut records: Vec<BidRecord> = if path.exists() {
                input::read_json(&path)?
            } else {
                Vec::new()
            };
            records.push(record);
            input::write_json(&path, &records)?;
        }
        None => println!("{}", serde_json::to_string_pretty(&record)?),
    }

    Ok(())
}
