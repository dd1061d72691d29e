//! Intents agent library
//!
//! Settlement client, intent codec and signer, and the deposit/swap/withdraw
//! orchestrators moving value between the NEAR intents contract and Zcash.

pub mod address;
pub mod agent;
pub mod bridge_client;
pub mod config;
pub mod context;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod notifier;
pub mod registry;
pub mod relay_client;
pub mod service;

// Re-export public types for convenience
pub use address::{AddressClassifier, ChainTag};
pub use agent::{BridgeSwapOutcome, IntentsAgent};
pub use bridge_client::{BridgeClient, WithdrawalStatus};
pub use config::{AgentConfig, PollingConfig};
pub use context::AgentContext;
pub use crypto::{IntentMessage, IntentSigner, SignedPayload};
pub use error::{IntentsError, IntentsResult};
pub use ledger::Ledger;
pub use notifier::{Notifier, TracingNotifier};
pub use registry::{AssetDescriptor, TokenRegistry};
pub use relay_client::{select_best_quote, Quote, SettlementClient, SettlementOutcome, SettlementStatus};
pub use service::{DepositOutcome, SwapOutcome, TokenBalance, WithdrawOutcome, ZcashWalletBalance};
