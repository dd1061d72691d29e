//! NEP-413 intent signing

use borsh::BorshSerialize;
use chain_clients_near::keys::encode_signature;
use chain_clients_near::NearSecretKey;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::str::FromStr;

use super::nonce::{encode_nonce, NONCE_LENGTH};
use crate::error::{IntentsError, IntentsResult};

/// Envelope tag prepended to the borsh payload: `2^31 + 413`.
pub const NEP413_TAG: u32 = (1u32 << 31) + 413;

/// Borsh layout hashed for signing.
#[derive(Debug, Clone, BorshSerialize)]
pub struct Nep413Payload {
    pub message: String,
    pub nonce: [u8; NONCE_LENGTH],
    pub recipient: String,
    pub callback_url: Option<String>,
}

/// `sha256(le_u32(NEP413_TAG) || borsh(payload))`, the actual signing target.
pub fn payload_hash(payload: &Nep413Payload) -> IntentsResult<[u8; 32]> {
    let mut bytes = NEP413_TAG.to_le_bytes().to_vec();
    payload
        .serialize(&mut bytes)
        .map_err(|e| IntentsError::InvalidInput(format!("Failed to encode payload: {}", e)))?;
    Ok(Sha256::digest(&bytes).into())
}

/// A signed message, with raw signature/key retained next to their encodings.
#[derive(Debug, Clone)]
pub struct SignedPayload {
    pub message: String,
    pub nonce: [u8; NONCE_LENGTH],
    pub recipient: String,
    pub hash: [u8; 32],
    pub signature: [u8; 64],
    pub public_key: [u8; 32],
}

impl SignedPayload {
    /// `ed25519:<base58>` signature.
    pub fn signature_b58(&self) -> String {
        encode_signature(&self.signature)
    }

    /// `ed25519:<base58>` public key.
    pub fn public_key_b58(&self) -> String {
        encode_signature(&self.public_key)
    }

    pub fn nonce_b64(&self) -> String {
        encode_nonce(&self.nonce)
    }

    /// `signed_data` object of a `publish_intent` request.
    pub fn signed_data(&self) -> SignedData {
        SignedData {
            payload: SignedDataPayload {
                message: self.message.clone(),
                nonce: self.nonce_b64(),
                recipient: self.recipient.clone(),
            },
            standard: "nep413".to_string(),
            signature: self.signature_b58(),
            public_key: self.public_key_b58(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedData {
    pub payload: SignedDataPayload,
    pub standard: String,
    pub signature: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedDataPayload {
    pub message: String,
    pub nonce: String,
    pub recipient: String,
}

/// Signs intents on behalf of one account.
#[derive(Debug, Clone)]
pub struct IntentSigner {
    signer_id: String,
    key: NearSecretKey,
}

impl IntentSigner {
    pub fn new(signer_id: impl Into<String>, key: NearSecretKey) -> Self {
        Self {
            signer_id: signer_id.into(),
            key,
        }
    }

    /// Builds a signer from an `ed25519:<base58>` secret key.
    ///
    /// A key that does not decode to 64 bytes is a configuration error: every
    /// later signing call would fail the same way.
    pub fn from_credentials(signer_id: &str, private_key: &str) -> IntentsResult<Self> {
        let key = NearSecretKey::from_str(private_key)
            .map_err(|e| IntentsError::Config(format!("{:#}", e)))?;
        Ok(Self::new(signer_id, key))
    }

    pub fn signer_id(&self) -> &str {
        &self.signer_id
    }

    pub fn key(&self) -> &NearSecretKey {
        &self.key
    }

    /// `ed25519:<base58>` public key of the signing key.
    pub fn public_key(&self) -> String {
        self.key.public_key()
    }

    /// Signs `message` for `recipient` under `nonce`.
    pub fn sign(
        &self,
        message: String,
        nonce: [u8; NONCE_LENGTH],
        recipient: &str,
    ) -> IntentsResult<SignedPayload> {
        let payload = Nep413Payload {
            message,
            nonce,
            recipient: recipient.to_string(),
            callback_url: None,
        };
        let hash = payload_hash(&payload)?;
        let signature = self.key.sign(&hash);

        Ok(SignedPayload {
            message: payload.message,
            nonce,
            recipient: payload.recipient,
            hash,
            signature,
            public_key: self.key.public_key_bytes(),
        })
    }
}
