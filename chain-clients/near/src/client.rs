//! NEAR JSON-RPC Client
//!
//! Read-only contract views go through `query/call_function`. State-changing calls
//! fetch the access-key nonce and a recent block hash, sign a borsh transaction
//! locally and submit it with `broadcast_tx_commit`.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use borsh::BorshSerialize;
use chain_clients_common::{JsonRpcRequest, JsonRpcResponse};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::keys::NearSecretKey;
use crate::transaction::{Action, FunctionCallAction, PublicKey, Transaction};

/// Result of a `call_function` query.
#[derive(Debug, Clone, Deserialize)]
struct CallFunctionResult {
    #[serde(default)]
    result: Option<Vec<u8>>,
    /// Older nodes report contract panics here instead of a JSON-RPC error.
    #[serde(default)]
    error: Option<String>,
}

/// Result of a `view_access_key` query.
#[derive(Debug, Clone, Deserialize)]
struct AccessKeyView {
    nonce: u64,
    block_hash: String,
}

/// Final outcome of a submitted transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CallOutcome {
    /// Execution status: `{"SuccessValue": ..}` or `{"Failure": ..}`.
    pub status: Value,
    /// Transaction hash (base58).
    pub transaction_hash: String,
}

impl CallOutcome {
    /// True when the final execution status is a `SuccessValue`.
    pub fn is_success(&self) -> bool {
        self.status.get("SuccessValue").is_some()
    }

    /// The failure payload when the transaction did not succeed.
    pub fn failure(&self) -> Option<&Value> {
        self.status.get("Failure")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FinalExecutionOutcome {
    status: Value,
    transaction: TransactionView,
}

#[derive(Debug, Clone, Deserialize)]
struct TransactionView {
    hash: String,
}

/// Client for a NEAR RPC endpoint acting on behalf of one account.
pub struct NearClient {
    /// HTTP client for JSON-RPC calls
    client: Client,
    /// RPC endpoint URL
    rpc_url: String,
    /// Signing account
    account_id: String,
    /// Key used for `call`; views work without it
    secret_key: Option<NearSecretKey>,
}

impl NearClient {
    /// Creates a new NEAR client.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - NEAR RPC endpoint
    /// * `account_id` - Account that signs transactions
    /// * `secret_key` - Account key, required for state-changing calls
    ///
    /// # Returns
    ///
    /// * `Ok(NearClient)` - Initialized client
    /// * `Err(anyhow::Error)` - Failed to build the HTTP client
    pub fn new(
        rpc_url: impl Into<String>,
        account_id: impl Into<String>,
        secret_key: Option<NearSecretKey>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            account_id: account_id.into(),
            secret_key,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn rpc<T: for<'de> Deserialize<'de>>(&self, method: &str, params: Value) -> Result<T> {
        let request = JsonRpcRequest::v2(method, params);
        let response: JsonRpcResponse<T> = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?
            .error_for_status()
            .with_context(|| format!("NEAR RPC rejected {} request", method))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))?;

        response.into_required(method)
    }

    /// Calls a read-only contract method and decodes its JSON return value.
    ///
    /// # Arguments
    ///
    /// * `contract_id` - Contract account
    /// * `method_name` - View method
    /// * `args` - JSON arguments
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - Decoded return value (`Null` for an empty return)
    /// * `Err(anyhow::Error)` - RPC failure or contract panic
    pub async fn view(&self, contract_id: &str, method_name: &str, args: &Value) -> Result<Value> {
        let args_bytes = serde_json::to_vec(args).context("Failed to serialize view args")?;
        let params = json!({
            "request_type": "call_function",
            "finality": "final",
            "account_id": contract_id,
            "method_name": method_name,
            "args_base64": STANDARD.encode(args_bytes),
        });

        let result: CallFunctionResult = self.rpc("query", params).await?;
        if let Some(error) = result.error {
            anyhow::bail!("View {}.{} failed: {}", contract_id, method_name, error);
        }

        let bytes = result.result.unwrap_or_default();
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to decode {}.{} return value", contract_id, method_name))
    }

    /// Signs and submits a single function-call transaction, waiting for its final outcome.
    ///
    /// # Arguments
    ///
    /// * `contract_id` - Receiver contract
    /// * `method_name` - Method to call
    /// * `args` - JSON arguments
    /// * `gas` - Attached gas
    /// * `deposit` - Attached deposit in yoctoNEAR
    ///
    /// # Returns
    ///
    /// * `Ok(CallOutcome)` - Final outcome (may still be a failure status)
    /// * `Err(anyhow::Error)` - Missing key, RPC or signing failure
    pub async fn call(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &Value,
        gas: u64,
        deposit: u128,
    ) -> Result<CallOutcome> {
        let key = self
            .secret_key
            .as_ref()
            .context("NEAR client has no secret key configured for calls")?;

        let access_key: AccessKeyView = self
            .rpc(
                "query",
                json!({
                    "request_type": "view_access_key",
                    "finality": "final",
                    "account_id": self.account_id,
                    "public_key": key.public_key(),
                }),
            )
            .await
            .context("Failed to fetch access key")?;

        let block_hash: [u8; 32] = bs58::decode(&access_key.block_hash)
            .into_vec()
            .context("Invalid block hash encoding")?
            .try_into()
            .map_err(|_| anyhow::anyhow!("Block hash must be 32 bytes"))?;

        let transaction = Transaction {
            signer_id: self.account_id.clone(),
            public_key: PublicKey(key.public_key_bytes()),
            nonce: access_key.nonce + 1,
            receiver_id: contract_id.to_string(),
            block_hash,
            actions: vec![Action::FunctionCall(FunctionCallAction {
                method_name: method_name.to_string(),
                args: serde_json::to_vec(args).context("Failed to serialize call args")?,
                gas,
                deposit,
            })],
        };

        let signed = transaction.sign(key).context("Failed to sign transaction")?;
        let encoded = STANDARD.encode(signed.try_to_vec().context("Failed to encode transaction")?);
        debug!(
            "Submitting {}.{} (deposit={}, gas={}) tx={}",
            contract_id,
            method_name,
            deposit,
            gas,
            bs58::encode(signed.hash).into_string()
        );

        let outcome: FinalExecutionOutcome = self
            .rpc("broadcast_tx_commit", json!([encoded]))
            .await?;

        info!(
            "Transaction {} for {}.{} finished",
            outcome.transaction.hash, contract_id, method_name
        );

        Ok(CallOutcome {
            status: outcome.status,
            transaction_hash: outcome.transaction.hash,
        })
    }
}
