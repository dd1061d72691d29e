//! Agent context
//!
//! One explicit object holding every collaborator the orchestrators use:
//! ledger, relay, bridge, Zcash node, signer, notifier and the registry snapshot.

use chain_clients_near::NearClient;
use chain_clients_zcash::{ZcashCredentials, ZcashRpcClient};
use std::sync::Arc;
use tracing::info;

use crate::address::AddressClassifier;
use crate::bridge_client::BridgeClient;
use crate::config::{AgentConfig, PollingConfig, ZcashConfig};
use crate::crypto::IntentSigner;
use crate::error::{IntentsError, IntentsResult};
use crate::ledger::Ledger;
use crate::notifier::{Notifier, TracingNotifier};
use crate::registry::TokenRegistry;
use crate::relay_client::SettlementClient;

pub struct AgentContext {
    pub registry: Arc<TokenRegistry>,
    pub ledger: Arc<dyn Ledger>,
    pub settlement: SettlementClient,
    pub bridge: BridgeClient,
    pub signer: IntentSigner,
    pub notifier: Arc<dyn Notifier>,
    pub classifier: AddressClassifier,
    pub zcash: Option<Arc<ZcashRpcClient>>,
    pub zcash_config: Option<ZcashConfig>,
    pub settlement_contract: String,
    pub polling: PollingConfig,
}

impl AgentContext {
    /// Builds the production context: NEAR RPC ledger, tracing notifier and
    /// the registry snapshot named by the configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(AgentContext)` - Ready to serve requests
    /// * `Err(IntentsError::Config)` - Missing/malformed key, unreadable registry or bad client setup
    pub fn from_config(config: &AgentConfig) -> IntentsResult<Self> {
        let private_key = config
            .near_private_key()
            .map_err(|e| IntentsError::Config(format!("{:#}", e)))?;
        let signer = IntentSigner::from_credentials(&config.near.account_id, &private_key)?;
        info!("Signer {} uses public key {}", signer.signer_id(), signer.public_key());

        let registry = TokenRegistry::load_from_path(&config.service.tokens_path)
            .map_err(|e| IntentsError::Config(format!("{:#}", e)))?;
        info!("Loaded {} assets from {}", registry.assets().len(), config.service.tokens_path);

        let ledger = NearClient::new(
            config.near.rpc_url.clone(),
            config.near.account_id.clone(),
            Some(signer.key().clone()),
        )
        .map_err(|e| IntentsError::Config(format!("{:#}", e)))?;

        Self::builder(config, Arc::new(registry), Arc::new(ledger), signer)
    }

    /// Builds a context around an explicit ledger and registry.
    pub fn builder(
        config: &AgentConfig,
        registry: Arc<TokenRegistry>,
        ledger: Arc<dyn Ledger>,
        signer: IntentSigner,
    ) -> IntentsResult<Self> {
        let to_config = |e: anyhow::Error| IntentsError::Config(format!("{:#}", e));

        let zcash = match &config.zcash {
            Some(zcash_config) => {
                let credentials = zcash_config
                    .credentials()
                    .map(|(user, password)| ZcashCredentials { user, password });
                Some(Arc::new(
                    ZcashRpcClient::new(zcash_config.node_url.clone(), credentials).map_err(to_config)?,
                ))
            }
            None => None,
        };

        Ok(Self {
            registry,
            ledger,
            settlement: SettlementClient::new(config.service.relay_url.clone(), config.polling.clone())
                .map_err(to_config)?,
            bridge: BridgeClient::new(config.service.bridge_url.clone()).map_err(to_config)?,
            signer,
            notifier: Arc::new(TracingNotifier),
            classifier: AddressClassifier::new(zcash.clone()).map_err(to_config)?,
            zcash,
            zcash_config: config.zcash.clone(),
            settlement_contract: config.service.settlement_contract.clone(),
            polling: config.polling.clone(),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn account_id(&self) -> &str {
        self.signer.signer_id()
    }

    /// The Zcash node, or a configuration error when none is configured.
    pub fn zcash_node(&self) -> IntentsResult<&ZcashRpcClient> {
        self.zcash
            .as_deref()
            .ok_or_else(|| IntentsError::Config("No [zcash] node configured".to_string()))
    }

    pub fn zcash_settings(&self) -> IntentsResult<&ZcashConfig> {
        self.zcash_config
            .as_ref()
            .ok_or_else(|| IntentsError::Config("No [zcash] node configured".to_string()))
    }
}
