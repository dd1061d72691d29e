//! NEAR ledger access
//!
//! Orchestrators only need `view` and `call`; the [`Ledger`] trait is that seam.
//! The helpers below wrap the settlement-contract and NEP-141 methods used by
//! deposits, swaps and withdrawals.

use async_trait::async_trait;
use chain_clients_near::{CallOutcome, NearClient};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{IntentsError, IntentsResult};

/// Gas for `near_deposit`, `storage_deposit` and `add_public_key`.
pub const FT_DEPOSIT_GAS: u64 = 30_000_000_000_000;
/// Gas for `ft_transfer_call`.
pub const FT_TRANSFER_GAS: u64 = 50_000_000_000_000;
/// Storage deposit covering NEP-141 registration (1.25e21 yoctoNEAR).
pub const FT_MINIMUM_STORAGE_BALANCE_LARGE: u128 = 1_250_000_000_000_000_000_000;
pub const ONE_YOCTO: u128 = 1;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Account whose key signs calls.
    fn account_id(&self) -> &str;

    /// Read-only contract call returning decoded JSON.
    async fn view(&self, contract_id: &str, method_name: &str, args: Value) -> anyhow::Result<Value>;

    /// State-changing function call.
    async fn call(
        &self,
        contract_id: &str,
        method_name: &str,
        args: Value,
        gas: u64,
        deposit: u128,
    ) -> anyhow::Result<CallOutcome>;
}

#[async_trait]
impl Ledger for NearClient {
    fn account_id(&self) -> &str {
        NearClient::account_id(self)
    }

    async fn view(&self, contract_id: &str, method_name: &str, args: Value) -> anyhow::Result<Value> {
        NearClient::view(self, contract_id, method_name, &args).await
    }

    async fn call(
        &self,
        contract_id: &str,
        method_name: &str,
        args: Value,
        gas: u64,
        deposit: u128,
    ) -> anyhow::Result<CallOutcome> {
        NearClient::call(self, contract_id, method_name, &args, gas, deposit).await
    }
}

/// Parses a u128 carried as a JSON string (NEAR convention) or number.
pub fn parse_u128(value: &Value) -> IntentsResult<u128> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|_| IntentsError::Transient(format!("Invalid amount '{}' from ledger", s))),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| IntentsError::Transient(format!("Invalid amount {} from ledger", n))),
        Value::Null => Ok(0),
        other => Err(IntentsError::Transient(format!("Unexpected amount {} from ledger", other))),
    }
}

/// Fails with `Terminal` unless the call reports `SuccessValue`.
pub fn require_success(outcome: &CallOutcome, what: &str) -> IntentsResult<()> {
    if outcome.is_success() {
        Ok(())
    } else {
        Err(IntentsError::Terminal(format!(
            "{} failed in transaction {}: {}",
            what,
            outcome.transaction_hash,
            outcome.failure().unwrap_or(&outcome.status)
        )))
    }
}

// ============================================================================
// SETTLEMENT CONTRACT
// ============================================================================

/// Live balances in the settlement contract, in the order of `token_ids`.
pub async fn settlement_balances(
    ledger: &dyn Ledger,
    settlement_contract: &str,
    account_id: &str,
    token_ids: &[String],
) -> IntentsResult<Vec<u128>> {
    let result = ledger
        .view(
            settlement_contract,
            "mt_batch_balance_of",
            json!({"account_id": account_id, "token_ids": token_ids}),
        )
        .await?;

    let balances = result
        .as_array()
        .ok_or_else(|| IntentsError::Transient(format!("mt_batch_balance_of returned {}", result)))?
        .iter()
        .map(parse_u128)
        .collect::<IntentsResult<Vec<u128>>>()?;

    if balances.len() != token_ids.len() {
        return Err(IntentsError::Transient(format!(
            "mt_batch_balance_of returned {} balances for {} tokens",
            balances.len(),
            token_ids.len()
        )));
    }
    Ok(balances)
}

pub async fn settlement_balance(
    ledger: &dyn Ledger,
    settlement_contract: &str,
    account_id: &str,
    token_id: &str,
) -> IntentsResult<u128> {
    let balances =
        settlement_balances(ledger, settlement_contract, account_id, &[token_id.to_string()]).await?;
    Ok(balances[0])
}

/// Registers `public_key` for the ledger account unless the contract already knows it.
pub async fn ensure_public_key(
    ledger: &dyn Ledger,
    settlement_contract: &str,
    public_key: &str,
) -> IntentsResult<()> {
    let registered = ledger
        .view(
            settlement_contract,
            "has_public_key",
            json!({"account_id": ledger.account_id(), "public_key": public_key}),
        )
        .await?;
    if registered.as_bool().unwrap_or(false) {
        return Ok(());
    }

    info!("Registering public key {} on {}", public_key, settlement_contract);
    let outcome = ledger
        .call(
            settlement_contract,
            "add_public_key",
            json!({"public_key": public_key}),
            FT_DEPOSIT_GAS,
            ONE_YOCTO,
        )
        .await?;
    require_success(&outcome, "add_public_key")
}

// ============================================================================
// NEP-141 TOKENS
// ============================================================================

/// `storage_balance_of(account_id)` on a token contract; `None` when unregistered.
pub async fn storage_balance(
    ledger: &dyn Ledger,
    token_contract: &str,
    account_id: &str,
) -> IntentsResult<Option<u128>> {
    let result = ledger
        .view(token_contract, "storage_balance_of", json!({"account_id": account_id}))
        .await?;
    if result.is_null() {
        return Ok(None);
    }
    parse_u128(result.get("available").unwrap_or(&Value::Null)).map(Some)
}

pub async fn ft_balance(ledger: &dyn Ledger, token_contract: &str, account_id: &str) -> IntentsResult<u128> {
    let result = ledger
        .view(token_contract, "ft_balance_of", json!({"account_id": account_id}))
        .await?;
    parse_u128(&result)
}
