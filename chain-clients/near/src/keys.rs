//! NEAR ed25519 key handling
//!
//! NEAR encodes secret keys as `ed25519:<base58>` over 64 bytes: the 32-byte seed
//! followed by the 32-byte public key.

use anyhow::{Context, Result};
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use std::str::FromStr;

/// Curve prefix used by NEAR for ed25519 keys and signatures.
pub const ED25519_PREFIX: &str = "ed25519:";

/// Length of a decoded NEAR secret key (seed + public key).
pub const SECRET_KEY_LENGTH: usize = 64;

/// A decoded NEAR ed25519 secret key.
#[derive(Clone)]
pub struct NearSecretKey {
    signing_key: SigningKey,
}

impl NearSecretKey {
    /// Builds a key from the raw 64-byte NEAR secret key.
    ///
    /// Only the first 32 bytes (the seed) are used for signing.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_LENGTH {
            anyhow::bail!(
                "The private key must be exactly {} bytes long, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            );
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Raw public key bytes derived from the seed.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key in NEAR string form (`ed25519:<base58>`).
    pub fn public_key(&self) -> String {
        format!(
            "{}{}",
            ED25519_PREFIX,
            bs58::encode(self.public_key_bytes()).into_string()
        )
    }

    /// Signs `message` and returns the raw 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl FromStr for NearSecretKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let encoded = s.strip_prefix(ED25519_PREFIX).unwrap_or(s);
        let bytes = bs58::decode(encoded)
            .into_vec()
            .context("Failed to decode private key from base58")?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Debug for NearSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NearSecretKey")
            .field("public_key", &self.public_key())
            .finish()
    }
}

/// Formats raw signature bytes in NEAR string form (`ed25519:<base58>`).
pub fn encode_signature(signature: &[u8]) -> String {
    format!("{}{}", ED25519_PREFIX, bs58::encode(signature).into_string())
}
