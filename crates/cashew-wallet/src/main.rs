//! cashew-wallet
//!
//! Operator CLI for a local Cashu wallet database. Decodes tokens and
//! invoices, checks mnemonics, and inspects ledger, balances and mints.
//!
//! Usage:
//!   cashew-wallet decode-token     <token|url>
//!   cashew-wallet decode-invoice   <invoice>
//!   cashew-wallet check-mnemonic   [<phrase>]        (reads stdin if omitted)
//!   cashew-wallet generate-mnemonic
//!   cashew-wallet history          [--limit <n>]     [--data-dir <dir>]
//!   cashew-wallet balance                            [--data-dir <dir>]
//!   cashew-wallet mints                              [--data-dir <dir>]
//!   cashew-wallet add-mint         <url>             [--data-dir <dir>]
//!   cashew-wallet show-config                        [--config <file>]

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};

use cashew_core::{
    codec::{decode_token, extract_encoded_token},
    invoice::{decode_invoice, extract_encoded_invoice, invoice_data, invoice_expires_at},
    mint::Mint,
    proof::keysets_of,
    token::{distinct_mints_of, proofs_of_entries, sum_token_amount},
};
use cashew_crypto::{derive_seed, generate_mnemonic, seed_hash, validate_mnemonic};
use cashew_state::{MintRegistry, ProofStore, TransactionLedger, WalletDb};

mod config;
use config::WalletConfig;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cashew-wallet",
    version,
    about = "Cashew wallet: inspect tokens, invoices and the local wallet database"
)]
struct Args {
    /// Directory holding the wallet database.
    #[arg(long, global = true, default_value = "~/.cashew")]
    data_dir: PathBuf,

    /// JSON file overriding recovery settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode an ecash token (raw, `cashu:` URI, or URL with a `token` parameter).
    DecodeToken {
        token: String,
    },

    /// Decode a BOLT-11 Lightning invoice (optionally `lightning:` prefixed).
    DecodeInvoice {
        invoice: String,
    },

    /// Validate a 12-word mnemonic and print its seed hash.
    CheckMnemonic {
        /// Phrase to check. Read from stdin when omitted.
        phrase: Option<String>,
    },

    /// Print a fresh 12-word mnemonic.
    GenerateMnemonic,

    /// List recent transactions, newest first.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print spendable and pending balances.
    Balance,

    /// List trusted mints with their keysets and derivation counters.
    Mints,

    /// Trust a new mint.
    AddMint {
        url: String,
    },

    /// Print the effective recovery configuration.
    ShowConfig,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,cashew_wallet=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = WalletConfig::load(expand_tilde(&args.data_dir), args.config.as_deref())?;
    debug!(data_dir = %cfg.data_dir.display(), "configuration loaded");

    match args.command {
        Command::DecodeToken { token } => cmd_decode_token(&token),

        Command::DecodeInvoice { invoice } => cmd_decode_invoice(&invoice),

        Command::CheckMnemonic { phrase } => {
            let phrase = match phrase {
                Some(p) => p,
                None => read_stdin_line().context("reading mnemonic from stdin")?,
            };
            let mnemonic = validate_mnemonic(&phrase)?;
            let seed = tokio::task::spawn_blocking(move || derive_seed(&mnemonic))
                .await
                .context("deriving seed")?;
            println!("Mnemonic:   valid");
            println!("Seed hash:  {}", seed_hash(&seed));
            Ok(())
        }

        Command::GenerateMnemonic => {
            println!("{}", generate_mnemonic()?);
            Ok(())
        }

        Command::History { limit } => {
            let db = open_db(&cfg)?;
            let txs = db.recent_transactions(limit).await?;
            if txs.is_empty() {
                println!("No transactions.");
            }
            for tx in txs {
                println!(
                    "{:>6}  {}  {:<8}  {:<9}  {:>10} sat  {}  {}",
                    tx.id,
                    tx.created_at.format("%Y-%m-%d %H:%M:%S"),
                    format!("{:?}", tx.tx_type).to_uppercase(),
                    tx.status,
                    tx.amount,
                    tx.mint_url,
                    tx.memo.as_deref().unwrap_or(""),
                );
            }
            Ok(())
        }

        Command::Balance => {
            let db = open_db(&cfg)?;
            let balances = db.balances().await?;
            println!("{}", serde_json::to_string_pretty(&balances)?);
            Ok(())
        }

        Command::Mints => {
            let db = open_db(&cfg)?;
            let mints = db.all_mints().await?;
            if mints.is_empty() {
                println!("No mints.");
            }
            for mint in mints {
                println!(
                    "{}  keysets={}  counter={}  current={}",
                    mint.mint_url,
                    mint.keysets.len(),
                    mint.proofs_counter,
                    mint.current_keyset().unwrap_or("-"),
                );
            }
            Ok(())
        }

        Command::AddMint { url } => {
            url::Url::parse(&url).with_context(|| format!("invalid mint URL {url}"))?;
            let db = open_db(&cfg)?;
            if db.find_by_url(&url).await?.is_some() {
                println!("Mint already trusted: {url}");
                return Ok(());
            }
            db.add_mint(Mint::new(url.clone())).await?;
            db.flush()?;
            info!(mint_url = %url, "mint added");
            println!("Added mint: {url}");
            Ok(())
        }

        Command::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────────────

fn cmd_decode_token(input: &str) -> anyhow::Result<()> {
    let encoded = extract_encoded_token(input)?;
    let token = decode_token(&encoded)?;
    let amounts = sum_token_amount(&token);
    let proofs = proofs_of_entries(&token.token);

    let summary = json!({
        "unit": &token.unit,
        "memo": &token.memo,
        "mints": distinct_mints_of(&token),
        "total_amount": amounts.total_amount,
        "mint_amounts": amounts.mint_amounts,
        "proofs": proofs.len(),
        "keysets": keysets_of(&proofs),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_decode_invoice(input: &str) -> anyhow::Result<()> {
    let encoded = extract_encoded_invoice(input)?;
    let decoded = decode_invoice(&encoded)?;
    let data = invoice_data(&decoded);
    let expires_at = invoice_expires_at(data.timestamp, data.expiry);

    let summary = json!({
        "amount": data.amount,
        "description": data.description,
        "payment_hash": data.payment_hash,
        "timestamp": data.timestamp,
        "expiry": data.expiry,
        "expires_at": expires_at.to_rfc3339(),
        "sections": decoded.sections,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn open_db(cfg: &WalletConfig) -> anyhow::Result<WalletDb> {
    let path = cfg.db_path();
    std::fs::create_dir_all(&cfg.data_dir)
        .with_context(|| format!("creating data dir {}", cfg.data_dir.display()))?;
    WalletDb::open(&path).with_context(|| format!("opening wallet database {}", path.display()))
}

fn read_stdin_line() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
