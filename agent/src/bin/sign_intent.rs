//! Intent Signature Generation Utility
//!
//! Signs an already serialized intent message with NEP-413 and prints the
//! publish-ready `signed_data` object. No configuration file or network access
//! is needed: the key is read from `NEAR_PRIVATE_KEY`.
//!
//! ## Usage
//!
//! ```bash
//! NEAR_PRIVATE_KEY=ed25519:... cargo run --bin sign_intent -- \
//!   --signer agent.near \
//!   --message '{"signer_id":"agent.near","deadline":"2025-01-21T14:55:40.000Z","intents":[]}' \
//!   --recipient intents.near \
//!   --nonce 42
//! ```

use anyhow::{Context, Result};
use intents_agent::crypto::{generate_nonce, normalize_nonce, IntentSigner, NonceInput};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("Usage: sign_intent --signer <account_id> --message <json> [--recipient <contract>] [--nonce <text>]");
        eprintln!("\nThe ed25519 secret key is read from NEAR_PRIVATE_KEY.");
        std::process::exit(1);
    }

    // Parse arguments
    let mut signer = None;
    let mut message = None;
    let mut recipient = "intents.near".to_string();
    let mut nonce = None;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--signer" => signer = value,
            "--message" => message = value,
            "--recipient" => recipient = value.context("--recipient needs a value")?,
            "--nonce" => nonce = value,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
        i += 2;
    }

    let signer = signer.context("--signer is required")?;
    let message = message.context("--message is required")?;
    serde_json::from_str::<serde_json::Value>(&message).context("--message must be a JSON intent message")?;

    let private_key = std::env::var("NEAR_PRIVATE_KEY").context("NEAR_PRIVATE_KEY env var is required")?;
    let signer = IntentSigner::from_credentials(&signer, &private_key)?;

    let nonce = match nonce {
        Some(text) => normalize_nonce(NonceInput::Text(&text))?,
        None => generate_nonce(),
    };

    let signed = signer.sign(message, nonce, &recipient)?;

    eprintln!("Signer: {}", signer.signer_id());
    eprintln!("Public key: {}", signed.public_key_b58());
    eprintln!("Payload hash: {}", bs58::encode(signed.hash).into_string());
    println!(
        "{}",
        serde_json::to_string_pretty(&signed.signed_data()).context("Failed to serialize signed data")?
    );

    Ok(())
}
