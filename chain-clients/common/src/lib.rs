//! Shared utilities for the chain client crates
//!
//! Provides the JSON-RPC envelope types spoken by the NEAR RPC, the zcashd node,
//! the settlement relay and the chain bridge, plus exact base-10 conversion between
//! raw on-chain integer amounts and display decimals.

pub mod jsonrpc;
pub mod units;

pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use units::{format_units, from_raw_units, parse_units, to_raw_units};
