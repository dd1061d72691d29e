//! JSON-RPC request/response envelopes
//!
//! The relay and bridge speak JSON-RPC 2.0 with numeric ids, zcashd speaks the
//! bitcoind-style 1.0 dialect with string ids. Both share the same shape.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request wrapper
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<P> {
    pub id: Value,
    pub jsonrpc: String,
    pub method: String,
    pub params: P,
}

impl<P: Serialize> JsonRpcRequest<P> {
    /// Builds a JSON-RPC 2.0 request with id `1`.
    pub fn v2(method: &str, params: P) -> Self {
        Self {
            id: Value::from(1),
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        }
    }

    /// Builds a JSON-RPC 1.0 request (zcashd dialect) with a string id.
    pub fn v1(method: &str, params: P) -> Self {
        Self {
            id: Value::from("intents-agent"),
            jsonrpc: "1.0".to_string(),
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.data {
            Some(data) => write!(f, "{} ({}): {}", self.message, self.code, data),
            None => write!(f, "{} ({})", self.message, self.code),
        }
    }
}

/// JSON-RPC response wrapper
///
/// `result` is optional because the relay answers a successful call with
/// `"result": null` when it has nothing to offer yet.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct JsonRpcResponse<T> {
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    /// Converts an error envelope into an `Err`, leaving an optional result otherwise.
    pub fn into_result(self, method: &str) -> Result<Option<T>> {
        if let Some(error) = self.error {
            anyhow::bail!("{} failed: {}", method, error);
        }
        Ok(self.result)
    }

    /// Like [`into_result`](Self::into_result) but treats a missing result as an error.
    pub fn into_required(self, method: &str) -> Result<T> {
        self.into_result(method)?
            .ok_or_else(|| anyhow::anyhow!("{} returned no result", method))
    }
}
