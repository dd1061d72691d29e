//! Shared test helpers for intents agent tests
//!
//! Constants, an in-memory ledger, a recording notifier and builders for a
//! context wired to mock relay/bridge/node servers.

#![allow(dead_code)]

use async_trait::async_trait;
use chain_clients_near::{CallOutcome, NearSecretKey};
use intents_agent::config::{NearConfig, ServiceConfig, ZcashConfig};
use intents_agent::{AgentConfig, AgentContext, IntentSigner, Ledger, Notifier, PollingConfig, TokenRegistry};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Signing account
pub const DUMMY_ACCOUNT_ID: &str = "agent.near";

/// Settlement contract
pub const DUMMY_SETTLEMENT: &str = "intents.near";

/// Endpoint nothing listens on; any request to it fails
pub const DUMMY_UNREACHABLE_URL: &str = "http://127.0.0.1:9";

// ------------------------------- ASSETS ---------------------------------

pub const ASSET_WNEAR: &str = "nep141:wrap.near";
pub const ASSET_USDC_NEAR: &str = "nep141:usdc.near";
pub const ASSET_USDC_ETH: &str = "nep141:eth-usdc.omft.near";
pub const ASSET_USDC_BASE: &str = "nep141:base-usdc.omft.near";
pub const ASSET_AAA: &str = "nep141:aaa.near";
pub const ASSET_BBB: &str = "nep141:bbb.near";
pub const ASSET_ZEC: &str = "nep141:zec.omft.near";

// ------------------------------- HASHES ---------------------------------

pub const DUMMY_QUOTE_HASH: &str = "QuoteHash111111111111111111111111";
pub const DUMMY_INTENT_HASH: &str = "IntentHash11111111111111111111111";
pub const DUMMY_TX_HASH: &str = "SettlementTx11111111111111111111";
pub const DUMMY_QUOTE_EXPIRATION: &str = "2030-01-01T00:00:00.000Z";

// -------------------------------- ZCASH ---------------------------------

pub const DUMMY_ZCASH_UA: &str = "u1dummyunifiedaddress";
pub const DUMMY_ZCASH_T_ADDR: &str = "t1DummyTransparentReceiver";
pub const DUMMY_ZCASH_RECEIVE: &str = "u1dummyreceiveaddress";
pub const DUMMY_ZCASH_SHIELDED_DEST: &str = "zs1dummyshieldeddestination";
pub const DUMMY_BRIDGE_DEPOSIT_ADDR: &str = "t1BridgeDepositAddress";

/// Registry used across tests: one NEAR-only symbol pair, a multi-chain USDC,
/// wrapped NEAR and ZEC.
pub const TEST_TOKENS: &str = r#"[
    {"symbol": "AAA", "blockchain": "near", "decimals": 6, "defuse_asset_id": "nep141:aaa.near", "min_withdraw_amount": "0", "price": "2"},
    {"symbol": "BBB", "blockchain": "near", "decimals": 18, "defuse_asset_id": "nep141:bbb.near", "min_withdraw_amount": "0", "price": "0.5"},
    {"symbol": "USDC", "blockchain": "near", "decimals": 6, "defuse_asset_id": "nep141:usdc.near", "min_withdraw_amount": "500000", "price": "1"},
    {"symbol": "USDC", "blockchain": "eth", "decimals": 6, "defuse_asset_id": "nep141:eth-usdc.omft.near", "min_withdraw_amount": "1000000", "price": "1"},
    {"symbol": "USDC", "blockchain": "base", "decimals": 6, "defuse_asset_id": "nep141:base-usdc.omft.near", "min_withdraw_amount": "1000000", "price": "1"},
    {"symbol": "WNEAR", "blockchain": "near", "decimals": 24, "defuse_asset_id": "nep141:wrap.near", "min_withdraw_amount": "0", "price": "3"},
    {"symbol": "ZEC", "blockchain": "zec", "decimals": 8, "defuse_asset_id": "nep141:zec.omft.near", "min_withdraw_amount": "100000", "price": "30"}
]"#;

// ============================================================================
// KEYS, REGISTRY, CONFIG
// ============================================================================

pub fn test_key() -> NearSecretKey {
    NearSecretKey::from_bytes(&[7u8; 64]).unwrap()
}

pub fn test_signer() -> IntentSigner {
    IntentSigner::new(DUMMY_ACCOUNT_ID, test_key())
}

pub fn test_registry() -> TokenRegistry {
    TokenRegistry::from_json(TEST_TOKENS).unwrap()
}

/// Polling fast enough for tests; the shape of every policy is unchanged.
pub fn fast_polling() -> PollingConfig {
    PollingConfig {
        relay_status_interval_ms: 5,
        relay_status_timeout_ms: 200,
        quote_retry_delay_ms: 5,
        quote_max_attempts: 5,
        swap_retry_backoffs_ms: vec![5, 5],
        node_poll_interval_ms: 5,
        shield_timeout_ms: 300,
        deposit_confirm_interval_ms: 5,
        deposit_confirm_timeout_ms: 300,
        bridge_status_interval_ms: 5,
        bridge_timeout_ms: 300,
        bridge_empty_tolerance: 3,
        withdraw_deadline_secs: 180,
    }
}

pub fn test_config(relay_url: &str, bridge_url: &str, zcash: Option<ZcashConfig>) -> AgentConfig {
    AgentConfig {
        service: ServiceConfig {
            relay_url: relay_url.to_string(),
            bridge_url: bridge_url.to_string(),
            settlement_contract: DUMMY_SETTLEMENT.to_string(),
            tokens_path: "unused.json".to_string(),
        },
        near: NearConfig {
            rpc_url: DUMMY_UNREACHABLE_URL.to_string(),
            account_id: DUMMY_ACCOUNT_ID.to_string(),
            private_key_env: "NEAR_PRIVATE_KEY".to_string(),
        },
        zcash,
        polling: fast_polling(),
    }
}

pub fn test_zcash_config(node_url: &str, account_file: &str) -> ZcashConfig {
    ZcashConfig {
        node_url: node_url.to_string(),
        user_env: None,
        password_env: None,
        account_file: account_file.to_string(),
        receive_address: DUMMY_ZCASH_RECEIVE.to_string(),
        bridge_chain: "zec:mainnet".to_string(),
    }
}

/// Context over the fake ledger and recording notifier.
pub fn test_context(config: &AgentConfig, ledger: Arc<FakeLedger>, notifier: Arc<RecordingNotifier>) -> AgentContext {
    AgentContext::builder(config, Arc::new(test_registry()), ledger, test_signer())
        .unwrap()
        .with_notifier(notifier)
}

// ============================================================================
// FAKE LEDGER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub contract_id: String,
    pub method_name: String,
    pub args: Value,
    pub gas: u64,
    pub deposit: u128,
}

/// In-memory ledger.
///
/// Settlement balances are scripted per asset: each `mt_batch_balance_of` read
/// consumes the front value until only the last one remains.
pub struct FakeLedger {
    balances: Mutex<HashMap<String, VecDeque<u128>>>,
    views: Mutex<HashMap<(String, String), Value>>,
    calls: Mutex<Vec<RecordedCall>>,
    view_log: Mutex<Vec<(String, String)>>,
    failing_methods: Mutex<Vec<String>>,
    has_public_key: Mutex<bool>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            views: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            view_log: Mutex::new(Vec::new()),
            failing_methods: Mutex::new(Vec::new()),
            has_public_key: Mutex::new(true),
        }
    }

    pub fn with_balance(self, asset_id: &str, balance: u128) -> Self {
        self.with_balances(asset_id, &[balance])
    }

    pub fn with_balances(self, asset_id: &str, sequence: &[u128]) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert(asset_id.to_string(), sequence.iter().copied().collect());
        self
    }

    pub fn with_view(self, contract_id: &str, method_name: &str, result: Value) -> Self {
        self.views
            .lock()
            .unwrap()
            .insert((contract_id.to_string(), method_name.to_string()), result);
        self
    }

    pub fn failing(self, method_name: &str) -> Self {
        self.failing_methods.lock().unwrap().push(method_name.to_string());
        self
    }

    pub fn without_public_key(self) -> Self {
        *self.has_public_key.lock().unwrap() = false;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn views(&self) -> Vec<(String, String)> {
        self.view_log.lock().unwrap().clone()
    }

    fn next_balance(&self, asset_id: &str) -> u128 {
        let mut balances = self.balances.lock().unwrap();
        match balances.get_mut(asset_id) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(0),
            Some(queue) => queue.front().copied().unwrap_or(0),
            None => 0,
        }
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    fn account_id(&self) -> &str {
        DUMMY_ACCOUNT_ID
    }

    async fn view(&self, contract_id: &str, method_name: &str, args: Value) -> anyhow::Result<Value> {
        self.view_log
            .lock()
            .unwrap()
            .push((contract_id.to_string(), method_name.to_string()));

        match method_name {
            "mt_batch_balance_of" => {
                let token_ids: Vec<String> = serde_json::from_value(args["token_ids"].clone())?;
                Ok(Value::Array(
                    token_ids
                        .iter()
                        .map(|id| Value::String(self.next_balance(id).to_string()))
                        .collect(),
                ))
            }
            "has_public_key" => Ok(Value::Bool(*self.has_public_key.lock().unwrap())),
            _ => Ok(self
                .views
                .lock()
                .unwrap()
                .get(&(contract_id.to_string(), method_name.to_string()))
                .cloned()
                .unwrap_or(Value::Null)),
        }
    }

    async fn call(
        &self,
        contract_id: &str,
        method_name: &str,
        args: Value,
        gas: u64,
        deposit: u128,
    ) -> anyhow::Result<CallOutcome> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(RecordedCall {
            contract_id: contract_id.to_string(),
            method_name: method_name.to_string(),
            args,
            gas,
            deposit,
        });

        let failing = self.failing_methods.lock().unwrap().iter().any(|m| m == method_name);
        let status = if failing {
            json!({"Failure": {"ActionError": {"index": 0, "kind": "FunctionCallError"}}})
        } else {
            json!({"SuccessValue": ""})
        };
        Ok(CallOutcome {
            status,
            transaction_hash: format!("NearTx{}", calls.len()),
        })
    }
}

// ============================================================================
// RECORDING NOTIFIER
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    infos: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

// ============================================================================
// RELAY / BRIDGE / NODE MOCKS
// ============================================================================

pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

pub fn quote_row(asset_in: &str, asset_out: &str, amount_in: u128, amount_out: u128) -> Value {
    json!({
        "defuse_asset_identifier_in": asset_in,
        "defuse_asset_identifier_out": asset_out,
        "amount_in": amount_in.to_string(),
        "amount_out": amount_out.to_string(),
        "quote_hash": DUMMY_QUOTE_HASH,
        "expiration_time": DUMMY_QUOTE_EXPIRATION,
    })
}

pub async fn mount_quotes(server: &MockServer, rows: Vec<Value>) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "quote"})))
        .respond_with(rpc_result(Value::Array(rows)))
        .mount(server)
        .await;
}

pub async fn mount_publish_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "publish_intent"})))
        .respond_with(rpc_result(json!({"status": "OK", "intent_hash": DUMMY_INTENT_HASH})))
        .mount(server)
        .await;
}

pub fn status_result(status: &str) -> ResponseTemplate {
    rpc_result(json!({
        "intent_hash": DUMMY_INTENT_HASH,
        "status": status,
        "data": {"hash": DUMMY_TX_HASH},
    }))
}

pub async fn mount_status(server: &MockServer, status: &str) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "get_status"})))
        .respond_with(status_result(status))
        .mount(server)
        .await;
}

/// Relay that quotes `amount_out` for the whole request and settles at once.
pub async fn mount_settling_relay(server: &MockServer, asset_in: &str, asset_out: &str, amount_in: u128, amount_out: u128) {
    mount_quotes(server, vec![quote_row(asset_in, asset_out, amount_in, amount_out)]).await;
    mount_publish_ok(server).await;
    mount_status(server, "SETTLED").await;
}

/// Every request body the server received for one JSON-RPC method.
pub async fn requests_for(server: &MockServer, rpc_method: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
        .filter(|body| body["method"] == rpc_method)
        .collect()
}

/// The intent message carried by a `publish_intent` request body.
pub fn published_message(body: &Value) -> Value {
    let message = body["params"][0]["signed_data"]["payload"]["message"]
        .as_str()
        .unwrap();
    serde_json::from_str(message).unwrap()
}

pub fn node_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"result": result, "error": null, "id": "intents-agent"}))
}

pub async fn mount_node(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(node_result(result))
        .mount(server)
        .await;
}
