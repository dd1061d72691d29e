//! Orchestrator services
//!
//! Each service executes one kind of operation end-to-end against the shared
//! [`AgentContext`](crate::context::AgentContext): swaps inside the settlement
//! contract, deposits into it, withdrawals out of it, the Zcash shield/unshield
//! legs and balance reporting.

pub mod balance;
pub mod deposit;
pub mod swap;
pub mod withdraw;
pub mod zcash;

// Re-export for convenience
pub use balance::{BalanceService, TokenBalance, ZcashWalletBalance, WALLET_FEE_RESERVE_ZAT};
pub use deposit::{DepositOutcome, DepositService};
pub use swap::{SwapOutcome, SwapService};
pub use withdraw::{WithdrawOutcome, WithdrawService};
pub use zcash::{to_zat, ZcashService, ZCASH_FEE_ZAT};
