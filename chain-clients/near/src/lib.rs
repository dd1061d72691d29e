//! NEAR ledger client
//!
//! Two primitives are exposed: read-only `view` calls and state-changing `call`
//! transactions signed locally with the account's ed25519 key.

pub mod client;
pub mod keys;
pub mod transaction;

pub use client::{CallOutcome, NearClient};
pub use keys::NearSecretKey;
pub use transaction::{Action, FunctionCallAction, SignedTransaction, Transaction};
