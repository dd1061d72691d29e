//! zcashd JSON-RPC Client
//!
//! zcashd speaks JSON-RPC 1.0 over HTTP with optional basic auth. Error
//! responses come back with a non-2xx status and a JSON error body, so the body
//! is always parsed before the status is judged.

use anyhow::{Context, Result};
use chain_clients_common::{format_units, JsonRpcRequest, JsonRpcResponse};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::types::*;
use crate::ZEC_DECIMALS;

/// Basic-auth credentials for the node RPC.
#[derive(Clone)]
pub struct ZcashCredentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for ZcashCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZcashCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client for a zcashd wallet node.
pub struct ZcashRpcClient {
    /// HTTP client for JSON-RPC calls
    client: Client,
    /// Node RPC URL
    node_url: String,
    credentials: Option<ZcashCredentials>,
}

impl ZcashRpcClient {
    /// Creates a new zcashd client.
    ///
    /// # Arguments
    ///
    /// * `node_url` - zcashd RPC endpoint
    /// * `credentials` - Optional basic-auth credentials
    ///
    /// # Returns
    ///
    /// * `Ok(ZcashRpcClient)` - Initialized client
    /// * `Err(anyhow::Error)` - Failed to build the HTTP client
    pub fn new(node_url: impl Into<String>, credentials: Option<ZcashCredentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            node_url: node_url.into(),
            credentials,
        })
    }

    async fn rpc_optional<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let request = JsonRpcRequest::v1(method, params);
        let body = serde_json::to_vec(&request).context("Failed to serialize request")?;

        let mut builder = self
            .client
            .post(&self.node_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body);
        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response", method))?;

        let parsed: JsonRpcResponse<T> = serde_json::from_str(&text).with_context(|| {
            format!("zcashd {} returned HTTP {}: {}", method, status, text)
        })?;
        debug!("zcashd {} -> HTTP {}", method, status);
        parsed.into_result(method)
    }

    async fn rpc<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        self.rpc_optional(method, params)
            .await?
            .ok_or_else(|| anyhow::anyhow!("zcashd {} returned no result", method))
    }

    // ========================================================================
    // ACCOUNTS AND ADDRESSES
    // ========================================================================

    /// Creates a new wallet account (`z_getnewaccount`) and returns its number.
    pub async fn get_new_account(&self) -> Result<u32> {
        let created: NewAccount = self.rpc("z_getnewaccount", json!([])).await?;
        Ok(created.account)
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountEntry>> {
        self.rpc("z_listaccounts", json!([])).await
    }

    /// Derives a fresh unified address for `account` (`z_getaddressforaccount`).
    pub async fn get_address_for_account(&self, account: u32) -> Result<String> {
        let derived: AddressForAccount = self
            .rpc("z_getaddressforaccount", json!([account]))
            .await?;
        Ok(derived.address)
    }

    /// Returns the first unified address of `account`, deriving one if it has none.
    pub async fn unified_address(&self, account: u32) -> Result<String> {
        let accounts = self.list_accounts().await?;
        let existing = accounts
            .iter()
            .find(|entry| entry.account == account)
            .and_then(|entry| entry.addresses.iter().find_map(|a| a.ua.clone()));

        match existing {
            Some(ua) => Ok(ua),
            None => self.get_address_for_account(account).await,
        }
    }

    pub async fn list_addresses(&self) -> Result<Vec<AddressSource>> {
        self.rpc("listaddresses", json!([])).await
    }

    /// Finds the wallet account that owns `address` among its unified addresses.
    pub async fn find_account_for_address(&self, address: &str) -> Result<Option<u32>> {
        let sources = self.list_addresses().await?;
        Ok(sources
            .iter()
            .flat_map(|source| source.unified.iter())
            .find(|account| account.addresses.iter().any(|a| a.address == address))
            .map(|account| account.account))
    }

    pub async fn validate_address(&self, address: &str) -> Result<AddressValidation> {
        self.rpc("z_validateaddress", json!([address])).await
    }

    /// Splits a unified address into its per-pool receivers.
    pub async fn list_unified_receivers(&self, unified_address: &str) -> Result<UnifiedReceivers> {
        self.rpc("z_listunifiedreceivers", json!([unified_address]))
            .await
    }

    // ========================================================================
    // BALANCES
    // ========================================================================

    pub async fn wallet_info(&self) -> Result<WalletInfo> {
        self.rpc("getwalletinfo", json!([])).await
    }

    /// Pool balances of `account` (`z_getbalanceforaccount`).
    pub async fn account_balance(&self, account: u32) -> Result<AccountBalance> {
        Ok(self
            .rpc_optional("z_getbalanceforaccount", json!([account]))
            .await?
            .unwrap_or_default())
    }

    // ========================================================================
    // SENDING
    // ========================================================================

    /// Submits a `z_sendmany` with a single recipient and returns the operation id.
    ///
    /// # Arguments
    ///
    /// * `from` - Sending address (unified or transparent)
    /// * `to` - Recipient address
    /// * `amount_zat` - Amount the recipient receives, in zatoshis
    /// * `fee_zat` - Explicit fee, in zatoshis
    /// * `policy` - Privacy policy accepted for this transfer
    pub async fn send_many(
        &self,
        from: &str,
        to: &str,
        amount_zat: u64,
        fee_zat: u64,
        policy: PrivacyPolicy,
    ) -> Result<String> {
        let params = json!([
            from,
            [{
                "address": to,
                "amount": format_units(amount_zat as u128, ZEC_DECIMALS),
            }],
            1,
            format_units(fee_zat as u128, ZEC_DECIMALS),
            policy,
        ]);
        self.rpc("z_sendmany", params).await
    }

    pub async fn list_operation_ids(&self) -> Result<Vec<String>> {
        self.rpc("z_listoperationids", json!([])).await
    }

    pub async fn operation_status(&self, opids: &[String]) -> Result<Vec<OperationStatus>> {
        self.rpc("z_getoperationstatus", json!([opids])).await
    }
}
