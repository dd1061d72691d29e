//! Intent messages
//!
//! The message is serialized to a JSON string once and that exact string is both
//! signed and published, so amounts are rendered as integer strings in raw units
//! and never re-derived afterwards.

use chrono::{Duration, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{IntentsError, IntentsResult};
use crate::registry::AssetDescriptor;

/// Wrapped native token; withdrawing it unwraps to the receiver.
pub const WRAP_NEAR_CONTRACT: &str = "wrap.near";

/// Deadline format expected by the settlement contract (millisecond field fixed at zero).
const DEADLINE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";

/// Deadline `seconds` from now.
pub fn deadline_in(seconds: i64) -> String {
    (Utc::now() + Duration::seconds(seconds))
        .format(DEADLINE_FORMAT)
        .to_string()
}

/// Asset-id to signed-delta map, serialized in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenDiff(pub Vec<(String, String)>);

impl Serialize for TokenDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (asset_id, delta) in &self.0 {
            map.serialize_entry(asset_id, delta)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    TokenDiff {
        diff: TokenDiff,
    },
    FtWithdraw {
        receiver_id: String,
        token: String,
        amount: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        deposit: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        memo: Option<String>,
    },
    NativeWithdraw {
        receiver_id: String,
        amount: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentMessage {
    pub signer_id: String,
    pub deadline: String,
    pub intents: Vec<Intent>,
}

impl IntentMessage {
    /// Single `token_diff`: `-amount_in` of the source asset for `amount_out` of the target.
    pub fn swap(
        signer_id: &str,
        asset_in: &str,
        amount_in: u128,
        asset_out: &str,
        amount_out: u128,
        deadline: String,
    ) -> Self {
        Self {
            signer_id: signer_id.to_string(),
            deadline,
            intents: vec![Intent::TokenDiff {
                diff: TokenDiff(vec![
                    (asset_in.to_string(), format!("-{}", amount_in)),
                    (asset_out.to_string(), amount_out.to_string()),
                ]),
            }],
        }
    }

    /// Withdraw message shaped by the destination asset.
    ///
    /// * wrapped native token: `native_withdraw` to the receiver
    /// * NEAR-chain token: `ft_withdraw` carrying `storage_deposit` for receiver registration
    /// * foreign-chain token: `ft_withdraw` to the bridge contract with a `WITHDRAW_TO:` memo
    pub fn withdraw(
        signer_id: &str,
        asset: &AssetDescriptor,
        receiver: &str,
        amount: u128,
        storage_deposit: u128,
        deadline: String,
    ) -> Self {
        let token = asset.contract_id();
        let intent = if token == WRAP_NEAR_CONTRACT {
            Intent::NativeWithdraw {
                receiver_id: receiver.to_string(),
                amount: amount.to_string(),
            }
        } else if asset.blockchain.eq_ignore_ascii_case("near") {
            Intent::FtWithdraw {
                receiver_id: receiver.to_string(),
                token: token.to_string(),
                amount: amount.to_string(),
                deposit: Some(storage_deposit.to_string()),
                memo: None,
            }
        } else {
            Intent::FtWithdraw {
                receiver_id: token.to_string(),
                token: token.to_string(),
                amount: amount.to_string(),
                deposit: None,
                memo: Some(format!("WITHDRAW_TO:{}", receiver)),
            }
        };

        Self {
            signer_id: signer_id.to_string(),
            deadline,
            intents: vec![intent],
        }
    }

    /// The exact string that gets signed and published.
    pub fn to_message_string(&self) -> IntentsResult<String> {
        serde_json::to_string(self)
            .map_err(|e| IntentsError::InvalidInput(format!("Failed to serialize intent message: {}", e)))
    }
}
