//! Address Classifier
//!
//! Maps a destination string to every chain it could receive on. Pattern rules
//! run first; `zec` membership is decided by the Zcash node itself.

use anyhow::Result;
use chain_clients_zcash::ZcashRpcClient;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Chains a withdrawal can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChainTag {
    Near,
    Eth,
    Base,
    Arb,
    Gnosis,
    Bera,
    Btc,
    Doge,
    Zec,
}

/// Every EVM-compatible chain the bridge services; one `0x` address is valid on all of them.
pub const EVM_CHAINS: [ChainTag; 5] = [
    ChainTag::Eth,
    ChainTag::Base,
    ChainTag::Arb,
    ChainTag::Gnosis,
    ChainTag::Bera,
];

impl ChainTag {
    /// Tag as used in the registry's `blockchain` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainTag::Near => "near",
            ChainTag::Eth => "eth",
            ChainTag::Base => "base",
            ChainTag::Arb => "arb",
            ChainTag::Gnosis => "gnosis",
            ChainTag::Bera => "bera",
            ChainTag::Btc => "btc",
            ChainTag::Doge => "doge",
            ChainTag::Zec => "zec",
        }
    }
}

impl fmt::Display for ChainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct AddressClassifier {
    near: Regex,
    evm: Regex,
    btc: Vec<Regex>,
    doge: Regex,
    zcash: Option<Arc<ZcashRpcClient>>,
}

impl AddressClassifier {
    /// Compiles the pattern rules. Without a Zcash node nothing classifies as `zec`.
    pub fn new(zcash: Option<Arc<ZcashRpcClient>>) -> Result<Self> {
        Ok(Self {
            near: Regex::new(r"^(([a-z\d]+[-_])*[a-z\d]+\.)*([a-z\d]+[-_])*[a-z\d]+$")?,
            evm: Regex::new(r"^0x[a-fA-F0-9]{40}$")?,
            btc: vec![
                Regex::new(r"^1[1-9A-HJ-NP-Za-km-z]{25,34}$")?,
                Regex::new(r"^3[1-9A-HJ-NP-Za-km-z]{25,34}$")?,
                Regex::new(r"^bc1[02-9ac-hj-np-z]{11,87}$")?,
                Regex::new(r"^bc1p[02-9ac-hj-np-z]{42,87}$")?,
            ],
            doge: Regex::new(r"^[DA][1-9A-HJ-NP-Za-km-z]{25,33}$")?,
            zcash,
        })
    }

    /// Pattern rules only.
    pub fn classify_static(&self, address: &str) -> BTreeSet<ChainTag> {
        let mut chains = BTreeSet::new();
        if self.near.is_match(address) {
            chains.insert(ChainTag::Near);
        }
        if self.evm.is_match(address) {
            chains.extend(EVM_CHAINS);
        }
        if self.btc.iter().any(|re| re.is_match(address)) {
            chains.insert(ChainTag::Btc);
        }
        if self.doge.is_match(address) {
            chains.insert(ChainTag::Doge);
        }
        chains
    }

    /// Pattern rules plus a `z_validateaddress` call. An empty set means unroutable.
    ///
    /// A node that cannot be reached only removes `zec` from the result.
    pub async fn classify(&self, address: &str) -> BTreeSet<ChainTag> {
        let mut chains = self.classify_static(address);
        if let Some(node) = &self.zcash {
            match node.validate_address(address).await {
                Ok(validation) if validation.isvalid => {
                    chains.insert(ChainTag::Zec);
                }
                Ok(_) => {}
                Err(e) => warn!("Zcash address check for {} failed: {:#}", address, e),
            }
        }
        chains
    }
}
