//! Operator tooling for the prophets launch: whitelist roots and proofs, auction clearing and
//! mint batches.
//!
//! You can run this script using the following command:
//! ```shell
//! RUST_LOG=info cargo run --release -- clear --sigs sigs.json --prophets prophets.json \
//!     --balances balances.json --mints mints.json
//! ```

use alloy_primitives::{hex, Address, B256};
use alloy_sol_types::SolCall;
use anyhow::{bail, Context, Result};
use arrival_lib::{
    batch::{build_batches, BatchConfig, MintGreatBatch},
    constants::{DEFAULT_MINT_BATCH_SIZE, DEFAULT_ORACLE_ATTEMPTS, MAX_MINT_BATCH_SIZE},
    inventory::{Inventory, InventorySummary},
    run_clearing,
    utils::{format_ether_trimmed, format_weth, parse_address},
    whitelist::verify,
    Allocation, BalanceRecord, BidRecord, ClearingResult, MintRecord, ProphetRecord, RetryPolicy,
    SplitSignature, Whitelist, WhitelistEntry, WhitelistTiers,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[path = "../lib/input.rs"]
mod input;
#[path = "../lib/logger.rs"]
mod logger;

/// The arguments for the command.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the Merkle root of a whitelist file.
    Root {
        #[clap(long)]
        list: PathBuf,
    },
    /// Prints the proof of a whitelisted user and the matching `mintProphet` calldata.
    Proof {
        #[clap(long)]
        list: PathBuf,
        #[clap(long, value_parser = parse_address)]
        user: Address,
    },
    /// Prints the roots of the three rounds and the `addUsersToWhitelist` calldata.
    Whitelist {
        #[clap(long)]
        settlers: PathBuf,
        #[clap(long)]
        firsts: PathBuf,
        #[clap(long)]
        seconds: PathBuf,
    },
    /// Splits a 65-byte signature into `v`, `r` and `s`.
    SplitSig {
        #[clap(long)]
        sig: String,
    },
    /// Clears the great prophets auction and writes the mints file.
    Clear {
        /// Collected bids.
        #[clap(long)]
        sigs: PathBuf,
        /// Prophets list with floor prices in ether.
        #[clap(long)]
        prophets: PathBuf,
        /// WETH balances and allowances towards the arrival contract.
        #[clap(long)]
        balances: PathBuf,
        /// Where the mints are written.
        #[clap(long)]
        mints: PathBuf,
        #[clap(long, env = "ARRIVAL_ADDRESS", value_parser = parse_address)]
        arrival: Address,
        #[clap(long, default_value_t = DEFAULT_ORACLE_ATTEMPTS)]
        oracle_attempts: usize,
    },
    /// Splits a mints file into `batchMintGreat` calls.
    Batches {
        #[clap(long)]
        mints: PathBuf,
        #[clap(long, env = "MINT_BATCH_SIZE", default_value_t = DEFAULT_MINT_BATCH_SIZE)]
        batch_size: usize,
        /// Where the batches are written, printed when omitted.
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Prints the greats count, their floor and BABL, and the BABL over every prophet.
    Prophets {
        #[clap(long)]
        prophets: PathBuf,
    },
}

/// One `batchMintGreat` transaction, as written to the batches file.
#[derive(Serialize)]
struct BatchOutput {
    #[serde(flatten)]
    batch: MintGreatBatch,
    calldata: String,
}

fn main() -> Result<()> {
    // Setup the logger.
    logger::setup_logger();

    // Parse the command line arguments.
    let args: Args = Args::parse();

    match args.command {
        Command::Root { list } => {
            let whitelist: Whitelist = load_whitelist(&list)?;
            println!("count: {}", whitelist.len());
            println!("root: {}", whitelist.root());
        }
        Command::Proof { list, user } => {
            let whitelist: Whitelist = load_whitelist(&list)?;
            let proof: Vec<B256> = whitelist.proof(&user)?;
            if !verify(&whitelist.root(), &proof, &user) {
                bail!("Proof for {user} does not verify against the list root");
            }

            println!("proof: {}", serde_json::to_string(&proof)?);
            println!(
                "calldata: {}",
                hex::encode_prefixed(whitelist.mint_call(&user)?.abi_encode())
            );
        }
        Command::Whitelist {
            settlers,
            firsts,
            seconds,
        } => {
            let tiers: WhitelistTiers = WhitelistTiers {
                settlers: load_whitelist(&settlers)?,
                firsts: load_whitelist(&firsts)?,
                seconds: load_whitelist(&seconds)?,
            };
            println!(
                "Updating whitelist with settlers ({}), first round ({}), and second round ({})",
                tiers.settlers.len(),
                tiers.firsts.len(),
                tiers.seconds.len()
            );
            println!("settlers root: {}", tiers.settlers.root());
            println!("firsts root: {}", tiers.firsts.root());
            println!("seconds root: {}", tiers.seconds.root());
            println!("calldata: {}", tiers.calldata());
        }
        Command::SplitSig { sig } => {
            let signature: SplitSignature = SplitSignature::from_hex(&sig)?;
            println!("v: {}", signature.v);
            println!("r: {}", signature.r);
            println!("s: {}", signature.s);
        }
        Command::Clear {
            sigs,
            prophets,
            balances,
            mints,
            arrival,
            oracle_attempts,
        } => {
            let bids: Vec<BidRecord> = input::read_json(&sigs)?;
            let prophets: Vec<ProphetRecord> = input::read_json(&prophets)?;
            let balances: Vec<BalanceRecord> = input::read_json(&balances)?;

            let result: ClearingResult = run_clearing(
                &arrival,
                &bids,
                &prophets,
                &balances,
                &RetryPolicy {
                    attempts: oracle_attempts,
                },
            )
            .context("Failed to clear the auction")?;

            input::write_json(&mints, &result.mint_records())?;
            info!(
                mints = result.allocations.len(),
                path = %mints.display(),
                "wrote mints"
            );
            println!("Total amount {} WETH", result.total_proceeds_weth());
        }
        Command::Batches {
            mints,
            batch_size,
            output,
        } => {
            let records: Vec<MintRecord> = input::read_json(&mints)?;
            let allocations: Vec<Allocation> = records
                .iter()
                .map(Allocation::from_mint_record)
                .collect::<Result<_, _>>()
                .context("Invalid mints file")?;

            let config: BatchConfig = BatchConfig {
                batch_size,
                max_batch_size: MAX_MINT_BATCH_SIZE,
            };
            let batches: Vec<BatchOutput> = build_batches(&allocations, &config)?
                .into_iter()
                .map(|batch: MintGreatBatch| BatchOutput {
                    calldata: batch.calldata().to_string(),
                    batch,
                })
                .collect();

            match output {
                Some(path) => input::write_json(&path, &batches)?,
                None => println!("{}", serde_json::to_string_pretty(&batches)?),
            }
        }
        Command::Prophets { prophets } => {
            let records: Vec<ProphetRecord> = input::read_json(&prophets)?;
            let summary: InventorySummary = Inventory::summarize(&records)?;
            println!("great prophets: {}", summary.count);
            println!("Greats is {} BABL", format_ether_trimmed(&summary.greats_babl));
            println!("Greats floor is {} WETH", format_weth(&summary.total_floor));
            println!("TotalBabl is {} BABL", format_ether_trimmed(&summary.total_babl));
        }
    }

    Ok(())
}

/// Reads a whitelist file and builds its tree, rejecting the whole file on any bad address.
fn load_whitelist(path: &Path) -> Result<Whitelist> {
    let entries: Vec<WhitelistEntry> = input::read_json(path)?;
    Whitelist::from_entries(&entries)
        .with_context(|| format!("Invalid whitelist {}", path.display()))
}
