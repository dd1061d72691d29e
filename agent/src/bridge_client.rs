//! Chain Bridge Client
//!
//! JSON-RPC client for the bridge that maps foreign-chain assets into the
//! settlement contract: deposit addresses and withdrawal status.

use anyhow::{Context, Result};
use chain_clients_common::{JsonRpcRequest, JsonRpcResponse};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
struct DepositAddressResult {
    address: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WithdrawalStatusResult {
    #[serde(default)]
    withdrawals: Vec<WithdrawalEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct WithdrawalEntry {
    status: String,
    #[serde(default)]
    data: Option<WithdrawalData>,
}

#[derive(Debug, Clone, Deserialize)]
struct WithdrawalData {
    #[serde(default)]
    transfer_tx_hash: Option<String>,
}

/// Bridge-side view of one withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalStatus {
    /// `PENDING`, `COMPLETED`, `FAILED`...
    pub status: String,
    /// Transaction on the destination chain, once known
    pub transfer_tx_hash: Option<String>,
}

impl WithdrawalStatus {
    pub fn is_pending(&self) -> bool {
        self.status == "PENDING"
    }
}

pub struct BridgeClient {
    client: Client,
    bridge_url: String,
}

impl BridgeClient {
    pub fn new(bridge_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            bridge_url: bridge_url.into(),
        })
    }

    async fn post(&self, method: &str, params: Value) -> Result<JsonRpcResponse<Value>> {
        self.client
            .post(&self.bridge_url)
            .json(&JsonRpcRequest::v2(method, params))
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?
            .error_for_status()
            .with_context(|| format!("Bridge rejected {} request", method))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))
    }

    /// Deposit address on `chain` (e.g. `zec:mainnet`) credited to `account_id`.
    pub async fn deposit_address(&self, account_id: &str, chain: &str) -> Result<String> {
        let response = self
            .post(
                "deposit_address",
                json!([{ "account_id": account_id, "chain": chain }]),
            )
            .await?;
        let result: DepositAddressResult = serde_json::from_value(response.into_required("deposit_address")?)
            .context("Malformed deposit_address result")?;
        Ok(result.address)
    }

    /// Status of the withdrawal created by the intent settled in `withdrawal_hash`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(status))` - The bridge knows the withdrawal
    /// * `Ok(None)` - Empty response (not indexed yet)
    /// * `Err(anyhow::Error)` - Transport or RPC error
    pub async fn withdrawal_status(&self, withdrawal_hash: &str) -> Result<Option<WithdrawalStatus>> {
        let response = self
            .post(
                "withdrawal_status",
                json!([{ "withdrawal_hash": withdrawal_hash }]),
            )
            .await?;

        let Some(result) = response.into_result("withdrawal_status")? else {
            return Ok(None);
        };
        let result: WithdrawalStatusResult =
            serde_json::from_value(result).context("Malformed withdrawal_status result")?;

        Ok(result.withdrawals.into_iter().next().map(|entry| WithdrawalStatus {
            status: entry.status,
            transfer_tx_hash: entry.data.and_then(|d| d.transfer_tx_hash),
        }))
    }
}
