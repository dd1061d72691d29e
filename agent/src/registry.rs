//! Token Registry
//!
//! Immutable snapshot of the supported assets. One symbol may appear several
//! times, once per chain it is bridged from; listing order is preserved because
//! balance waterfalls walk the candidates in that order.

use anyhow::Context;
use chain_clients_common::{format_units, from_raw_units, to_raw_units};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{IntentsError, IntentsResult};

/// Prefix of NEP-141 asset ids inside the settlement contract.
pub const NEP141_PREFIX: &str = "nep141:";

/// One asset as known to the settlement contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Upper-case symbol (e.g., "USDC")
    pub symbol: String,
    /// Chain tag the asset is bridged from (e.g., "near", "eth", "zec")
    pub blockchain: String,
    pub decimals: u32,
    /// Settlement-contract asset id (e.g., "nep141:wrap.near")
    pub defuse_asset_id: String,
    /// Minimum withdrawal in raw units
    #[serde(default, deserialize_with = "deserialize_raw_amount")]
    pub min_withdraw_amount: u128,
    /// USD price per display unit
    #[serde(default)]
    pub price: Decimal,
}

impl AssetDescriptor {
    /// Token contract on NEAR (the asset id without its `nep141:` prefix).
    pub fn contract_id(&self) -> &str {
        self.defuse_asset_id
            .strip_prefix(NEP141_PREFIX)
            .unwrap_or(&self.defuse_asset_id)
    }

    /// Display amount to raw units using this asset's own decimals.
    pub fn to_raw(&self, amount: Decimal) -> IntentsResult<u128> {
        to_raw_units(amount, self.decimals)
            .map_err(|e| IntentsError::InvalidInput(format!("{} amount {}: {:#}", self.symbol, amount, e)))
    }

    /// Raw units to a display decimal.
    pub fn to_display(&self, raw: u128) -> IntentsResult<Decimal> {
        from_raw_units(raw, self.decimals)
            .map_err(|e| IntentsError::InvalidInput(format!("{} raw amount {}: {:#}", self.symbol, raw, e)))
    }

    /// Raw units formatted for messages.
    pub fn format(&self, raw: u128) -> String {
        format!("{} {}", format_units(raw, self.decimals), self.symbol)
    }
}

/// The registry file is either a bare list or the console API's `{"items": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    List(Vec<AssetDescriptor>),
    Items { items: Vec<AssetDescriptor> },
}

#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    assets: Vec<AssetDescriptor>,
}

impl TokenRegistry {
    pub fn new(assets: Vec<AssetDescriptor>) -> Self {
        Self { assets }
    }

    /// Loads a registry snapshot from a JSON file.
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token registry {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse token registry {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let assets = match serde_json::from_str::<RegistryFile>(content)? {
            RegistryFile::List(assets) => assets,
            RegistryFile::Items { items } => items,
        };
        Ok(Self::new(assets))
    }

    pub fn assets(&self) -> &[AssetDescriptor] {
        &self.assets
    }

    /// Resolves a symbol, optionally pinned to a chain.
    ///
    /// Without a chain the first listed descriptor for the symbol is returned.
    pub fn resolve(&self, symbol: &str, blockchain: Option<&str>) -> IntentsResult<&AssetDescriptor> {
        self.assets
            .iter()
            .find(|a| {
                a.symbol.eq_ignore_ascii_case(symbol)
                    && blockchain.map_or(true, |chain| a.blockchain.eq_ignore_ascii_case(chain))
            })
            .ok_or_else(|| match blockchain {
                Some(chain) => IntentsError::NotFound(format!("Token {} is not supported on {}", symbol, chain)),
                None => IntentsError::NotFound(format!("Token {} is not supported", symbol)),
            })
    }

    /// Every chain-specific descriptor of `symbol`, in listing order.
    pub fn resolve_all(&self, symbol: &str) -> Vec<&AssetDescriptor> {
        self.assets
            .iter()
            .filter(|a| a.symbol.eq_ignore_ascii_case(symbol))
            .collect()
    }

    /// Resolves a symbol disambiguated by an explicit asset id when one is given.
    pub fn resolve_with_asset_id(
        &self,
        symbol: &str,
        asset_id: Option<&str>,
    ) -> IntentsResult<&AssetDescriptor> {
        match asset_id {
            None => self.resolve(symbol, None),
            Some(id) => self
                .resolve_all(symbol)
                .into_iter()
                .find(|a| a.defuse_asset_id == id)
                .ok_or_else(|| IntentsError::NotFound(format!("Token {} has no asset {}", symbol, id))),
        }
    }

    pub fn by_asset_id(&self, asset_id: &str) -> Option<&AssetDescriptor> {
        self.assets.iter().find(|a| a.defuse_asset_id == asset_id)
    }
}

fn deserialize_raw_amount<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n as u128),
        Raw::Text(s) => s.trim().parse::<u128>().map_err(serde::de::Error::custom),
    }
}
