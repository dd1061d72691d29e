//! Settlement Relay Client
//!
//! JSON-RPC client for the solver relay: quotes, intent publication and
//! settlement status polling.

use chain_clients_common::{JsonRpcRequest, JsonRpcResponse};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::PollingConfig;
use crate::crypto::SignedPayload;
use crate::error::{poll_until, Attempt, IntentsError, IntentsResult};

// ============================================================================
// TYPES
// ============================================================================

/// One quote row returned by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "defuse_asset_identifier_in")]
    pub asset_in: String,
    #[serde(rename = "defuse_asset_identifier_out")]
    pub asset_out: String,
    #[serde(deserialize_with = "deserialize_u128_string", serialize_with = "serialize_u128_string")]
    pub amount_in: u128,
    #[serde(deserialize_with = "deserialize_u128_string", serialize_with = "serialize_u128_string")]
    pub amount_out: u128,
    pub quote_hash: String,
    pub expiration_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    Pending,
    Settled,
    Failed,
    NotFound,
}

impl SettlementStatus {
    /// Maps a relay status string. Anything not terminal (`PENDING`, `TX_BROADCASTED`...) is pending.
    pub fn from_relay(status: &str) -> Self {
        match status {
            "SETTLED" => SettlementStatus::Settled,
            "FAILED" => SettlementStatus::Failed,
            "NOT_FOUND_OR_NOT_VALID" | "NOT_FOUND_OR_NOT_VALID_ANYMORE" => SettlementStatus::NotFound,
            _ => SettlementStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SettlementStatus::Pending)
    }
}

/// Result of polling one intent.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub settled: bool,
    /// Last observed status; `Pending` after a timeout
    pub status: SettlementStatus,
    /// Last raw `get_status` response
    pub last_response: Value,
}

impl SettlementOutcome {
    /// Settlement transaction hash (`result.data.hash`).
    pub fn transaction_hash(&self) -> Option<String> {
        self.last_response
            .pointer("/result/data/hash")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PublishResult {
    status: String,
    #[serde(default)]
    intent_hash: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StatusResult {
    status: String,
}

/// Picks the row with the strictly greatest `amount_out`; ties keep the earliest row.
pub fn select_best_quote(quotes: &[Quote]) -> Option<&Quote> {
    let mut best: Option<&Quote> = None;
    for quote in quotes {
        if best.map_or(true, |b| quote.amount_out > b.amount_out) {
            best = Some(quote);
        }
    }
    best
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct SettlementClient {
    client: Client,
    relay_url: String,
    polling: PollingConfig,
}

impl SettlementClient {
    /// Creates a new relay client.
    ///
    /// # Arguments
    ///
    /// * `relay_url` - Relay JSON-RPC endpoint
    /// * `polling` - Quote retry and status polling settings
    pub fn new(relay_url: impl Into<String>, polling: PollingConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            relay_url: relay_url.into(),
            polling,
        })
    }

    /// Posts one JSON-RPC call. HTTP errors carry the response body.
    async fn post(&self, method: &str, params: Value) -> IntentsResult<JsonRpcResponse<Value>> {
        let request = JsonRpcRequest::v2(method, params);
        let response = self
            .client
            .post(&self.relay_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| IntentsError::Transient(format!("Failed to send {} request: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntentsError::Transient(format!(
                "Relay {} failed with HTTP {}: {}",
                method, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IntentsError::Transient(format!("Failed to parse {} response: {}", method, e)))
    }

    /// Requests quotes for `exact_amount_in` raw units of `asset_in`.
    ///
    /// Null results are retried (`quote_max_attempts`, `quote_retry_delay_ms` apart).
    /// HTTP and RPC errors abort at once. An empty list is not retried.
    ///
    /// # Returns
    ///
    /// * `Ok(rows)` - Quote rows (possibly empty)
    /// * `Ok(vec![])` - Every attempt came back null
    /// * `Err(IntentsError::Transient)` - Transport, HTTP or RPC error
    pub async fn quotes(&self, asset_in: &str, asset_out: &str, exact_amount_in: u128) -> IntentsResult<Vec<Quote>> {
        let params = json!([{
            "defuse_asset_identifier_in": asset_in,
            "defuse_asset_identifier_out": asset_out,
            "exact_amount_in": exact_amount_in.to_string(),
        }]);

        for attempt in 1..=self.polling.quote_max_attempts {
            let response = self.post("quote", params.clone()).await?;
            match response.into_result("quote")? {
                Some(result) => {
                    return serde_json::from_value(result)
                        .map_err(|e| IntentsError::Transient(format!("Malformed quote rows: {}", e)));
                }
                None => {
                    debug!(
                        "Empty quote result on attempt {}/{}",
                        attempt, self.polling.quote_max_attempts
                    );
                    if attempt < self.polling.quote_max_attempts {
                        tokio::time::sleep(self.polling.quote_retry_delay()).await;
                    }
                }
            }
        }

        warn!("No quote result for {} -> {} after retries", asset_in, asset_out);
        Ok(Vec::new())
    }

    /// Best quote for the request, `None` when the relay offered nothing.
    pub async fn quote(&self, asset_in: &str, asset_out: &str, exact_amount_in: u128) -> IntentsResult<Option<Quote>> {
        let rows = self.quotes(asset_in, asset_out, exact_amount_in).await?;
        Ok(select_best_quote(&rows).cloned())
    }

    /// Publishes a signed intent and returns its intent hash.
    ///
    /// A status other than `OK` is a terminal failure for this attempt.
    pub async fn publish(&self, signed: &SignedPayload, quote_hashes: &[String]) -> IntentsResult<String> {
        let params = json!([{
            "quote_hashes": quote_hashes,
            "signed_data": signed.signed_data(),
        }]);

        let response = self.post("publish_intent", params).await?;
        let result: PublishResult = response
            .into_required("publish_intent")
            .map_err(IntentsError::from)
            .and_then(|value| {
                serde_json::from_value(value)
                    .map_err(|e| IntentsError::Transient(format!("Malformed publish_intent result: {}", e)))
            })?;

        match (result.status.as_str(), result.intent_hash) {
            ("OK", Some(intent_hash)) => {
                info!("Published intent {}", intent_hash);
                Ok(intent_hash)
            }
            (status, _) => Err(IntentsError::Terminal(format!(
                "publish_intent returned {}{}",
                status,
                result.reason.map(|r| format!(": {}", r)).unwrap_or_default()
            ))),
        }
    }

    /// Single `get_status` call.
    pub async fn status(&self, intent_hash: &str) -> IntentsResult<(SettlementStatus, Value)> {
        let request = json!([{ "intent_hash": intent_hash }]);
        let response = self.post("get_status", request).await?;
        let raw = json!({
            "result": response.result.clone(),
            "error": response.error.clone(),
        });
        let result: StatusResult = response
            .into_required("get_status")
            .map_err(IntentsError::from)
            .and_then(|value| {
                serde_json::from_value(value)
                    .map_err(|e| IntentsError::Transient(format!("Malformed get_status result: {}", e)))
            })?;
        Ok((SettlementStatus::from_relay(&result.status), raw))
    }

    /// Polls `get_status` until a terminal status or the relay timeout.
    ///
    /// `SETTLED` yields `settled = true`; `FAILED`, `NOT_FOUND_OR_NOT_VALID[_ANYMORE]`
    /// and the timeout yield `settled = false` with the last response.
    pub async fn poll_settlement(&self, intent_hash: &str) -> IntentsResult<SettlementOutcome> {
        let last = Mutex::new(Value::Null);
        let last_ref = &last;

        let terminal = poll_until("get_status", self.polling.relay_status(), || async move {
            match self.status(intent_hash).await {
                Ok((status, response)) => {
                    if let Ok(mut guard) = last_ref.lock() {
                        *guard = response.clone();
                    }
                    if status.is_terminal() {
                        Attempt::Done(SettlementOutcome {
                            settled: status == SettlementStatus::Settled,
                            status,
                            last_response: response,
                        })
                    } else {
                        Attempt::Retry(format!("intent {} still pending", intent_hash))
                    }
                }
                Err(e) => Attempt::Retry(format!("status check failed: {}", e)),
            }
        })
        .await?;

        Ok(terminal.unwrap_or_else(|| {
            warn!("Intent {} not settled within the relay timeout", intent_hash);
            SettlementOutcome {
                settled: false,
                status: SettlementStatus::Pending,
                last_response: last.into_inner().unwrap_or(Value::Null),
            }
        }))
    }

    /// Publishes and polls once; returns the intent hash with its settlement outcome.
    pub async fn publish_and_poll(
        &self,
        signed: &SignedPayload,
        quote_hashes: &[String],
    ) -> IntentsResult<(String, SettlementOutcome)> {
        let intent_hash = self.publish(signed, quote_hashes).await?;
        let outcome = self.poll_settlement(&intent_hash).await?;
        Ok((intent_hash, outcome))
    }
}

fn deserialize_u128_string<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    text.parse().map_err(serde::de::Error::custom)
}

fn serialize_u128_string<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_string())
}
