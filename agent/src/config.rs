//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the intents agent.
//! Configuration includes the relay and bridge endpoints, the NEAR account, the
//! optional Zcash node and every polling interval/timeout used by the orchestrators.
//! Secrets are never stored in the file: it names the environment variables holding them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::PollPolicy;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Relay, bridge and token snapshot locations
    pub service: ServiceConfig,
    /// NEAR account acting as intent signer
    pub near: NearConfig,
    /// Zcash node (required for ZEC deposits/withdrawals and `zec` address checks)
    #[serde(default)]
    pub zcash: Option<ZcashConfig>,
    /// Polling intervals and timeouts
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Service-level endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Solver relay JSON-RPC URL (quote, publish_intent, get_status)
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Chain bridge JSON-RPC URL (deposit_address, withdrawal_status)
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    /// Settlement contract account id
    #[serde(default = "default_settlement_contract")]
    pub settlement_contract: String,
    /// Path to the token registry snapshot (JSON list of asset descriptors)
    pub tokens_path: String,
}

/// NEAR account configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearConfig {
    /// NEAR RPC endpoint URL
    #[serde(default = "default_near_rpc_url")]
    pub rpc_url: String,
    /// Account id (e.g., "agent.near")
    pub account_id: String,
    /// Environment variable name containing the `ed25519:<base58>` secret key
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

/// Zcash node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZcashConfig {
    /// zcashd RPC endpoint URL
    pub node_url: String,
    /// Environment variable holding the RPC user (optional for open endpoints)
    #[serde(default)]
    pub user_env: Option<String>,
    /// Environment variable holding the RPC password
    #[serde(default)]
    pub password_env: Option<String>,
    /// File persisting the wallet account number used for unshielding
    pub account_file: String,
    /// Default receive/send address for ZEC
    pub receive_address: String,
    /// Bridge chain identifier for ZEC deposits
    #[serde(default = "default_bridge_chain")]
    pub bridge_chain: String,
}

/// Polling intervals and timeouts, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Relay `get_status` interval
    pub relay_status_interval_ms: u64,
    /// Relay settlement ceiling
    pub relay_status_timeout_ms: u64,
    /// Delay between quote requests answered with a null result
    pub quote_retry_delay_ms: u64,
    /// Quote requests per call
    pub quote_max_attempts: u32,
    /// Sleeps between whole-swap attempts (attempts = len + 1)
    pub swap_retry_backoffs_ms: Vec<u64>,
    /// Node balance / operation status interval
    pub node_poll_interval_ms: u64,
    /// Ceiling for shielding to land and for `z_sendmany` operations
    pub shield_timeout_ms: u64,
    /// Settlement-balance check interval after a ZEC deposit
    pub deposit_confirm_interval_ms: u64,
    /// Ceiling for a ZEC deposit to show up in the settlement contract
    pub deposit_confirm_timeout_ms: u64,
    /// Bridge `withdrawal_status` interval
    pub bridge_status_interval_ms: u64,
    /// Ceiling for bridge withdrawal status and for funds landing on the node
    pub bridge_timeout_ms: u64,
    /// Empty `withdrawal_status` responses tolerated before moving on
    pub bridge_empty_tolerance: u32,
    /// Withdraw intent deadline, seconds from now
    pub withdraw_deadline_secs: i64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            relay_status_interval_ms: 200,
            relay_status_timeout_ms: 30_000,
            quote_retry_delay_ms: 1_000,
            quote_max_attempts: 5,
            swap_retry_backoffs_ms: vec![2_000, 10_000],
            node_poll_interval_ms: 2_000,
            shield_timeout_ms: 300_000,
            deposit_confirm_interval_ms: 10_000,
            deposit_confirm_timeout_ms: 600_000,
            bridge_status_interval_ms: 2_000,
            bridge_timeout_ms: 600_000,
            bridge_empty_tolerance: 3,
            withdraw_deadline_secs: 180,
        }
    }
}

impl PollingConfig {
    fn policy(interval_ms: u64, timeout_ms: u64) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(interval_ms),
            Duration::from_millis(timeout_ms),
        )
    }

    pub fn relay_status(&self) -> PollPolicy {
        Self::policy(self.relay_status_interval_ms, self.relay_status_timeout_ms)
    }

    pub fn shielding(&self) -> PollPolicy {
        Self::policy(self.node_poll_interval_ms, self.shield_timeout_ms)
    }

    pub fn operation(&self) -> PollPolicy {
        Self::policy(self.node_poll_interval_ms, self.shield_timeout_ms)
    }

    pub fn deposit_confirmation(&self) -> PollPolicy {
        Self::policy(self.deposit_confirm_interval_ms, self.deposit_confirm_timeout_ms)
    }

    pub fn bridge_status(&self) -> PollPolicy {
        Self::policy(self.bridge_status_interval_ms, self.bridge_timeout_ms)
    }

    pub fn landing(&self) -> PollPolicy {
        Self::policy(self.node_poll_interval_ms, self.bridge_timeout_ms)
    }

    pub fn quote_retry_delay(&self) -> Duration {
        Duration::from_millis(self.quote_retry_delay_ms)
    }

    pub fn swap_backoffs(&self) -> Vec<Duration> {
        self.swap_retry_backoffs_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

fn default_relay_url() -> String {
    "https://solver-relay-v2.chaindefuser.com/rpc".to_string()
}

fn default_bridge_url() -> String {
    "https://bridge.chaindefuser.com/rpc".to_string()
}

fn default_settlement_contract() -> String {
    "intents.near".to_string()
}

fn default_near_rpc_url() -> String {
    "https://rpc.mainnet.near.org".to_string()
}

fn default_private_key_env() -> String {
    "NEAR_PRIVATE_KEY".to_string()
}

fn default_bridge_chain() -> String {
    "zec:mainnet".to_string()
}

impl AgentConfig {
    /// Loads configuration from a TOML file.
    ///
    /// This function:
    /// 1. Uses the provided path, else INTENTS_AGENT_CONFIG, else config/agent.toml
    /// 2. If it exists, loads and parses the configuration
    /// 3. Validates the configuration
    /// 4. If it doesn't exist, returns an error asking user to copy template
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to config file
    ///
    /// # Returns
    ///
    /// * `Ok(AgentConfig)` - Successfully loaded and validated configuration
    /// * `Err(anyhow::Error)` - File missing, unparsable or invalid
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let config_path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var("INTENTS_AGENT_CONFIG").ok())
            .unwrap_or_else(|| "config/agent.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: AgentConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/agent.template.toml config/agent.toml\n\
                Then edit config/agent.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Equivalent to `load_from_path(None)`.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from_path(None)
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Checks:
    /// - Endpoint URLs are http(s)
    /// - Account id and settlement contract are non-empty
    /// - Polling intervals are non-zero and below their timeouts
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_url("service.relay_url", &self.service.relay_url)?;
        validate_url("service.bridge_url", &self.service.bridge_url)?;
        validate_url("near.rpc_url", &self.near.rpc_url)?;

        if self.near.account_id.trim().is_empty() {
            return Err(anyhow::anyhow!("Configuration error: near.account_id must be set"));
        }
        if self.service.settlement_contract.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: service.settlement_contract must be set"
            ));
        }

        if let Some(zcash) = &self.zcash {
            validate_url("zcash.node_url", &zcash.node_url)?;
            if zcash.account_file.trim().is_empty() {
                return Err(anyhow::anyhow!("Configuration error: zcash.account_file must be set"));
            }
            if zcash.receive_address.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "Configuration error: zcash.receive_address must be set"
                ));
            }
        }

        let p = &self.polling;
        for (name, interval, timeout) in [
            ("relay_status", p.relay_status_interval_ms, p.relay_status_timeout_ms),
            ("node_poll/shield", p.node_poll_interval_ms, p.shield_timeout_ms),
            ("deposit_confirm", p.deposit_confirm_interval_ms, p.deposit_confirm_timeout_ms),
            ("bridge_status", p.bridge_status_interval_ms, p.bridge_timeout_ms),
        ] {
            if interval == 0 || interval > timeout {
                return Err(anyhow::anyhow!(
                    "Configuration error: polling {} interval {}ms must be non-zero and not exceed timeout {}ms",
                    name,
                    interval,
                    timeout
                ));
            }
        }
        if p.quote_max_attempts == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: polling.quote_max_attempts must be at least 1"
            ));
        }
        if p.withdraw_deadline_secs <= 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: polling.withdraw_deadline_secs must be positive"
            ));
        }

        Ok(())
    }

    /// Reads the NEAR secret key from the configured environment variable.
    pub fn near_private_key(&self) -> anyhow::Result<String> {
        std::env::var(&self.near.private_key_env).map_err(|_| {
            anyhow::anyhow!(
                "{} env var is required to sign intents",
                self.near.private_key_env
            )
        })
    }
}

impl ZcashConfig {
    /// Reads node credentials; `None` when no user variable is configured or set.
    pub fn credentials(&self) -> Option<(String, String)> {
        let user = std::env::var(self.user_env.as_deref()?).ok()?;
        let password = self
            .password_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .unwrap_or_default();
        Some((user, password))
    }
}

fn validate_url(field: &str, url: &str) -> anyhow::Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Configuration error: {} must be an http(s) URL, got '{}'",
            field,
            url
        ))
    }
}
