//! Intents Agent CLI
//!
//! Thin command surface over the orchestrators:
//! - deposit: wallet -> settlement contract
//! - swap: token -> token inside the settlement contract
//! - withdraw: settlement contract -> destination address
//! - bridge-swap: deposit, swap and withdraw in one go
//! - balance: settlement balances, or the Zcash wallet balance
//! - sign: build and sign a swap/withdraw message without publishing it
//!
//! ## Usage
//!
//! ```bash
//! NEAR_PRIVATE_KEY=ed25519:... cargo run --bin intents-agent -- --config config/agent.toml swap USDC 10 ZEC
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intents_agent::{
    crypto::{deadline_in, normalize_nonce, IntentMessage, NonceInput},
    AgentConfig, IntentsAgent,
};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "intents-agent")]
#[command(about = "Deposits, swaps and withdrawals through the NEAR intents settlement contract")]
struct Args {
    /// Path to agent configuration file (default: config/agent.toml or INTENTS_AGENT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deposit a token from the wallet into the settlement contract
    Deposit {
        token: String,
        amount: Decimal,
        /// Sending address (ZEC only; defaults to the configured receive address)
        #[arg(long)]
        sender: Option<String>,
    },
    /// Swap one token into another inside the settlement contract
    Swap {
        token_in: String,
        amount: Decimal,
        token_out: String,
        /// Asset id pinning the source chain variant
        #[arg(long)]
        source: Option<String>,
        /// Asset id pinning the target chain variant
        #[arg(long)]
        dest: Option<String>,
    },
    /// Withdraw a token from the settlement contract
    Withdraw {
        token: String,
        amount: Decimal,
        /// Destination address (defaults to the signing account)
        #[arg(long)]
        receiver: Option<String>,
        /// Destination chain when the address is valid on several
        #[arg(long)]
        chain: Option<String>,
    },
    /// Deposit, swap and withdraw the proceeds
    BridgeSwap {
        token_in: String,
        amount: Decimal,
        token_out: String,
        #[arg(long)]
        receiver: Option<String>,
        #[arg(long)]
        chain: Option<String>,
    },
    /// Show settlement balances (or the Zcash wallet with --zcash)
    Balance {
        #[arg(long)]
        zcash: bool,
        /// Wallet address for --zcash (defaults to the configured receive address)
        #[arg(long)]
        address: Option<String>,
    },
    /// Sign a message offline and print the publish-ready signed_data
    Sign {
        #[command(subcommand)]
        message: SignMessage,
        /// Nonce text (left-padded to 32 bytes); random when omitted
        #[arg(long, global = true)]
        nonce: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum SignMessage {
    /// token_diff giving `amount_in` of one asset for `amount_out` of another (raw units)
    Swap {
        asset_in: String,
        amount_in: u128,
        asset_out: String,
        amount_out: u128,
        #[arg(long, default_value_t = 180)]
        deadline_secs: i64,
    },
    /// Withdraw `amount` (raw units) of `token` to `receiver`
    Withdraw {
        token: String,
        amount: u128,
        receiver: String,
        #[arg(long)]
        chain: Option<String>,
        #[arg(long, default_value_t = 0)]
        storage_deposit: u128,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize structured logging (RUST_LOG, default info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AgentConfig::load_from_path(args.config.as_deref())?;
    info!("Configuration loaded for {}", config.near.account_id);
    let agent = IntentsAgent::from_config(&config)?;

    match args.command {
        Command::Deposit { token, amount, sender } => {
            let outcome = agent.deposit(&token, amount, sender.as_deref()).await?;
            println!("Deposited {} ({}) in {}", amount, outcome.asset_id, outcome.transaction_hash);
        }
        Command::Swap {
            token_in,
            amount,
            token_out,
            source,
            dest,
        } => {
            let outcome = agent
                .swap(&token_in, amount, &token_out, source.as_deref(), dest.as_deref())
                .await?;
            println!(
                "Swapped {} {} for {} {} (intent {})",
                amount, token_in, outcome.amount_out_display, token_out, outcome.intent_hash
            );
        }
        Command::Withdraw {
            token,
            amount,
            receiver,
            chain,
        } => {
            let hash = agent
                .withdraw(&token, amount, receiver.as_deref(), chain.as_deref())
                .await?;
            println!("Withdrawal transaction: {}", hash);
        }
        Command::BridgeSwap {
            token_in,
            amount,
            token_out,
            receiver,
            chain,
        } => {
            let outcome = agent
                .bridge_swap(&token_in, amount, &token_out, receiver.as_deref(), chain.as_deref())
                .await?;
            println!("Deposit: {}", outcome.deposit.transaction_hash);
            println!("Swap: {} {} received", outcome.swap.amount_out_display, token_out);
            println!("Withdrawal: {}", outcome.withdraw_transaction);
        }
        Command::Balance { zcash: true, address } => {
            let balance = agent.zcash_wallet_balance(address.as_deref()).await?;
            println!(
                "Account {}: transparent {} ZEC, shielded {} ZEC, spendable {} ZEC (${})",
                balance.account,
                balance.transparent,
                balance.shielded,
                balance.spendable,
                balance.usd_value.round_dp(2)
            );
        }
        Command::Balance { zcash: false, .. } => {
            let balances = agent.balances().await?;
            if balances.is_empty() {
                println!("No balances in {}", agent.context().settlement_contract);
            }
            for row in balances {
                println!("{:<8} {:>24} ${}", row.symbol, row.amount, row.usd_value.round_dp(2));
            }
        }
        Command::Sign { message, nonce } => {
            let ctx = agent.context();
            let message = match message {
                SignMessage::Swap {
                    asset_in,
                    amount_in,
                    asset_out,
                    amount_out,
                    deadline_secs,
                } => IntentMessage::swap(
                    ctx.account_id(),
                    &asset_in,
                    amount_in,
                    &asset_out,
                    amount_out,
                    deadline_in(deadline_secs),
                ),
                SignMessage::Withdraw {
                    token,
                    amount,
                    receiver,
                    chain,
                    storage_deposit,
                } => {
                    let asset = ctx.registry.resolve(&token, chain.as_deref())?;
                    IntentMessage::withdraw(
                        ctx.account_id(),
                        asset,
                        &receiver,
                        amount,
                        storage_deposit,
                        deadline_in(config.polling.withdraw_deadline_secs),
                    )
                }
            };
            let nonce = nonce
                .as_deref()
                .map(|text| normalize_nonce(NonceInput::Text(text)))
                .transpose()?;
            let signed = agent.sign_offline(&message, nonce)?;
            let output = serde_json::to_string_pretty(&signed.signed_data())
                .context("Failed to serialize signed data")?;
            println!("{}", output);
        }
    }

    Ok(())
}
