//! Response types for the zcashd wallet RPCs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// ACCOUNTS AND ADDRESSES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub account: u32,
}

/// One entry of `z_listaccounts`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountEntry {
    pub account: u32,
    #[serde(default)]
    pub addresses: Vec<AccountAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountAddress {
    #[serde(default)]
    pub ua: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressForAccount {
    pub account: Option<u32>,
    pub address: String,
}

/// One address source of `listaddresses` (legacy random, mnemonic seed, imported...).
///
/// Only the unified section carries account numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressSource {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub unified: Vec<UnifiedAccountAddresses>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnifiedAccountAddresses {
    pub account: u32,
    #[serde(default)]
    pub addresses: Vec<UnifiedAddressEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnifiedAddressEntry {
    pub address: String,
}

/// Result of `z_validateaddress`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressValidation {
    pub isvalid: bool,
    /// `p2pkh`, `p2sh`, `sprout`, `sapling` or `unified`; absent when invalid.
    #[serde(default)]
    pub address_type: Option<String>,
}

impl AddressValidation {
    /// True for transparent address types that need no unshielding hop.
    pub fn is_transparent(&self) -> bool {
        matches!(self.address_type.as_deref(), Some("p2pkh") | Some("p2sh"))
    }
}

/// Result of `z_listunifiedreceivers`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnifiedReceivers {
    #[serde(default)]
    pub p2pkh: Option<String>,
    #[serde(default)]
    pub p2sh: Option<String>,
    #[serde(default)]
    pub sapling: Option<String>,
    #[serde(default)]
    pub orchard: Option<String>,
}

impl UnifiedReceivers {
    pub fn transparent(&self) -> Option<&str> {
        self.p2pkh.as_deref().or(self.p2sh.as_deref())
    }

    pub fn shielded(&self) -> Option<&str> {
        self.sapling.as_deref().or(self.orchard.as_deref())
    }
}

// ============================================================================
// BALANCES
// ============================================================================

/// Result of `getwalletinfo` (only the fields used here).
#[derive(Debug, Clone, Deserialize)]
pub struct WalletInfo {
    pub balance: Value,
    #[serde(default)]
    pub shielded_balance: Option<Value>,
}

/// Result of `z_getbalanceforaccount`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountBalance {
    #[serde(default)]
    pub pools: Pools,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pools {
    #[serde(default)]
    pub transparent: Option<PoolBalance>,
    #[serde(default)]
    pub sapling: Option<PoolBalance>,
    #[serde(default)]
    pub orchard: Option<PoolBalance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolBalance {
    #[serde(rename = "valueZat", default)]
    pub value_zat: u64,
}

impl AccountBalance {
    pub fn transparent_zat(&self) -> u64 {
        self.pools.transparent.as_ref().map_or(0, |p| p.value_zat)
    }

    /// Sapling plus Orchard.
    pub fn shielded_zat(&self) -> u64 {
        let sapling = self.pools.sapling.as_ref().map_or(0, |p| p.value_zat);
        let orchard = self.pools.orchard.as_ref().map_or(0, |p| p.value_zat);
        sapling + orchard
    }

    pub fn total_zat(&self) -> u64 {
        self.transparent_zat() + self.shielded_zat()
    }
}

// ============================================================================
// SENDING
// ============================================================================

/// Privacy policy argument of `z_sendmany`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrivacyPolicy {
    NoPrivacy,
    AllowRevealedSenders,
}

impl fmt::Display for PrivacyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivacyPolicy::NoPrivacy => write!(f, "NoPrivacy"),
            PrivacyPolicy::AllowRevealedSenders => write!(f, "AllowRevealedSenders"),
        }
    }
}

/// Entry of `z_getoperationstatus`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationStatus {
    pub id: String,
    /// `queued`, `executing`, `success`, `failed` or `cancelled`.
    pub status: String,
    #[serde(default)]
    pub result: Option<OperationResult>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationResult {
    pub txid: String,
}
