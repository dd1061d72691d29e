//! Zcash node client
//!
//! Thin typed wrapper over the zcashd wallet RPCs used for shielding,
//! bridging and forwarding ZEC. Amounts cross this boundary in zatoshis.

pub mod client;
pub mod types;

pub use client::{ZcashCredentials, ZcashRpcClient};
pub use types::*;

/// Decimal places of ZEC (1 ZEC = 10^8 zatoshis).
pub const ZEC_DECIMALS: u32 = 8;
