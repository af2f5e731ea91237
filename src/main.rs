//! `defier` command-line front-end
//!
//! Drives a ledger persisted in a sled store. A caller acts as an address
//! by naming a keypair held in the same store.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use defier::account::{Address, Keypair};
use defier::config::TokenConfig;
use defier::service::LedgerService;
use defier::storage::LedgerStore;
use defier::token::units::{format_units, parse_units};
use defier::token::{BasisPoints, TokenLedger};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// DeFier token ledger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "defier")]
struct Cli {
    /// Directory holding the ledger store
    #[arg(short, long, default_value = "defier-data")]
    data_dir: PathBuf,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage local account keys
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// Create the ledger, minting the whole supply to governance
    Init {
        /// Label of the governance account
        #[arg(long)]
        governance: String,
        /// JSON token config (defaults apply to missing fields)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the event log
    Events {
        /// Only the most recent N events
        #[arg(long)]
        limit: Option<usize>,
    },
    #[command(flatten)]
    Ledger(LedgerCommand),
}

/// Commands that run against a loaded ledger
#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// Show token metadata, supply and rates
    Info,
    /// Show the balance of a label or address
    Balance { account: String },
    /// Transfer with fee and burn
    Transfer {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        amount: String,
    },
    /// Governance transfer without fee or burn
    TransferPrivileged {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        amount: String,
    },
    /// Allow a spender to move tokens from an owner
    Approve {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        spender: String,
        amount: String,
    },
    /// Spend an allowance, with fee and burn
    TransferFrom {
        #[arg(long)]
        spender: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        amount: String,
    },
    /// Set the transfer fee rate in basis points
    SetFeeRate {
        #[arg(long)]
        caller: String,
        rate: BasisPoints,
    },
    /// Set the burn rate in basis points
    SetBurnRate {
        #[arg(long)]
        caller: String,
        rate: BasisPoints,
    },
    /// Hand the governance role to another account
    ChangeGovernance {
        #[arg(long)]
        caller: String,
        new_address: String,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Generate and store a new keypair
    New { label: String },
    /// List stored accounts
    List,
    /// Print the hex secret of a stored account
    Export { label: String },
    /// Store a keypair from its hex secret
    Import { label: String, secret_hex: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = LedgerStore::open(&cli.data_dir)
        .with_context(|| format!("opening store at {}", cli.data_dir.display()))?;

    match cli.command {
        Command::Account { command } => run_account(&store, command),
        Command::Init { governance, config } => init(&store, &governance, config),
        Command::Events { limit } => print_events(&store, limit),
        Command::Ledger(command) => run_ledger(store, command).await,
    }
}

fn run_account(store: &LedgerStore, command: AccountCommand) -> Result<()> {
    match command {
        AccountCommand::New { label } => {
            if store.load_keypair(&label)?.is_some() {
                bail!("account '{}' already exists", label);
            }
            let keypair = Keypair::generate();
            store.save_keypair(&label, &keypair)?;
            store.flush()?;
            println!("{} {}", label, Address::from_public_key(&keypair.public_key()));
        }
        AccountCommand::List => {
            for (label, address) in store.list_accounts()? {
                println!("{:<16} {}", label, address);
            }
        }
        AccountCommand::Export { label } => {
            let keypair = store
                .load_keypair(&label)?
                .ok_or_else(|| anyhow!("unknown account '{}'", label))?;
            println!("{}", keypair.to_hex());
        }
        AccountCommand::Import { label, secret_hex } => {
            let keypair = Keypair::from_hex(&secret_hex)?;
            store.save_keypair(&label, &keypair)?;
            store.flush()?;
            println!("{} {}", label, Address::from_public_key(&keypair.public_key()));
        }
    }
    Ok(())
}

fn init(store: &LedgerStore, governance: &str, config_path: Option<PathBuf>) -> Result<()> {
    if store.has_ledger()? {
        bail!("ledger already initialized");
    }

    let config = match config_path {
        Some(path) => TokenConfig::from_json_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TokenConfig::default(),
    };
    let governance = caller_address(store, governance)?;

    let mut ledger = TokenLedger::new(&config, governance)?;
    let events = ledger.take_events();
    store.save_config(&config)?;
    store.save_ledger(&ledger, &events)?;
    store.flush()?;

    info!(%governance, "ledger created");
    println!(
        "minted {} {} to {}",
        format_units(ledger.total_supply(), ledger.decimals()),
        ledger.symbol(),
        governance
    );
    Ok(())
}

async fn run_ledger(store: LedgerStore, command: LedgerCommand) -> Result<()> {
    let ledger = store
        .load_ledger()?
        .ok_or_else(|| anyhow!("no ledger in store, run `defier init` first"))?;
    let decimals = ledger.decimals();
    let amount_of = |s: &str| parse_units(s, decimals).with_context(|| format!("amount '{}'", s));

    let service = LedgerService::spawn(ledger, Some(store.clone()));
    let ledger = service.handle();

    match command {
        LedgerCommand::Info => {
            let state = ledger.snapshot().await?;
            println!("name:        {}", state.name());
            println!("symbol:      {}", state.symbol());
            println!("decimals:    {}", state.decimals());
            println!("supply:      {}", format_units(state.total_supply(), decimals));
            println!("fee rate:    {}bp", state.fee_rate());
            println!("burn rate:   {}bp", state.burn_rate());
            println!("fee routing: {:?}", state.fee_routing());
            println!("governance:  {}", state.governance_address());
        }
        LedgerCommand::Balance { account } => {
            let address = resolve(&store, &account)?;
            let balance = ledger.balance_of(address).await?;
            println!("{}", format_units(balance, decimals));
        }
        LedgerCommand::Transfer { from, to, amount } => {
            let caller = caller_address(&store, &from)?;
            let to = resolve(&store, &to)?;
            let receipt = ledger.transfer(caller, to, amount_of(&amount)?).await?;
            println!(
                "sent {} (fee {}, burned {})",
                format_units(receipt.split.net, decimals),
                format_units(receipt.split.fee, decimals),
                format_units(receipt.split.burn, decimals)
            );
        }
        LedgerCommand::TransferPrivileged {
            caller,
            from,
            to,
            amount,
        } => {
            let caller = caller_address(&store, &caller)?;
            let from = resolve(&store, &from)?;
            let to = resolve(&store, &to)?;
            let amount = amount_of(&amount)?;
            ledger.transfer_no_fee_no_burn(caller, from, to, amount).await?;
            println!("sent {}", format_units(amount, decimals));
        }
        LedgerCommand::Approve {
            owner,
            spender,
            amount,
        } => {
            let owner = caller_address(&store, &owner)?;
            let spender = resolve(&store, &spender)?;
            ledger.approve(owner, spender, amount_of(&amount)?).await?;
        }
        LedgerCommand::TransferFrom {
            spender,
            from,
            to,
            amount,
        } => {
            let spender = caller_address(&store, &spender)?;
            let from = resolve(&store, &from)?;
            let to = resolve(&store, &to)?;
            let receipt = ledger.transfer_from(spender, from, to, amount_of(&amount)?).await?;
            println!(
                "sent {} (fee {}, burned {})",
                format_units(receipt.split.net, decimals),
                format_units(receipt.split.fee, decimals),
                format_units(receipt.split.burn, decimals)
            );
        }
        LedgerCommand::SetFeeRate { caller, rate } => {
            let caller = caller_address(&store, &caller)?;
            ledger.set_fee_rate(caller, rate).await?;
        }
        LedgerCommand::SetBurnRate { caller, rate } => {
            let caller = caller_address(&store, &caller)?;
            ledger.set_burn_rate(caller, rate).await?;
        }
        LedgerCommand::ChangeGovernance { caller, new_address } => {
            let caller = caller_address(&store, &caller)?;
            let new_address = resolve(&store, &new_address)?;
            ledger.change_governance_address(caller, new_address).await?;
        }
    }

    service.shutdown().await?;
    Ok(())
}

fn print_events(store: &LedgerStore, limit: Option<usize>) -> Result<()> {
    for record in store.load_events(limit)? {
        println!(
            "#{:<6} {} {}",
            record.sequence(),
            record.recorded_at().format("%Y-%m-%d %H:%M:%S"),
            record.event()
        );
    }
    Ok(())
}

/// Address of a locally held account; only these may act as callers
fn caller_address(store: &LedgerStore, label: &str) -> Result<Address> {
    let keypair = store
        .load_keypair(label)?
        .ok_or_else(|| anyhow!("no local key for account '{}'", label))?;
    Ok(Address::from_public_key(&keypair.public_key()))
}

/// A stored label, or else a base58 address
fn resolve(store: &LedgerStore, account: &str) -> Result<Address> {
    if let Some(keypair) = store.load_keypair(account)? {
        return Ok(Address::from_public_key(&keypair.public_key()));
    }
    account
        .parse::<Address>()
        .with_context(|| format!("'{}' is neither a stored account nor an address", account))
}
