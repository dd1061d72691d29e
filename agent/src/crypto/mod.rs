//! Intent codec and signer
//!
//! This module builds intent messages, normalizes nonces and produces NEP-413
//! signatures over them.

pub mod message;
pub mod nonce;
pub mod signing;

// Re-export for convenience
pub use message::{deadline_in, Intent, IntentMessage, TokenDiff, WRAP_NEAR_CONTRACT};
pub use nonce::{decode_nonce, encode_nonce, generate_nonce, normalize_nonce, NonceInput, NONCE_LENGTH};
pub use signing::{payload_hash, IntentSigner, Nep413Payload, SignedData, SignedPayload, NEP413_TAG};
