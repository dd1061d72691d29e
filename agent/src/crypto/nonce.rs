//! Nonce generation and normalization

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{IntentsError, IntentsResult};

pub const NONCE_LENGTH: usize = 32;

/// Padding byte for short nonces. ASCII `'0'`, not NUL: this is what the relay re-derives.
const NONCE_PAD: u8 = b'0';

/// Accepted nonce inputs.
#[derive(Debug, Clone, Copy)]
pub enum NonceInput<'a> {
    /// UTF-8 text, left-padded to 32 bytes
    Text(&'a str),
    /// Raw bytes, left-padded to 32 bytes
    Bytes(&'a [u8]),
    /// Explicit byte list; must already be exactly 32 long
    List(&'a [u8]),
}

/// 32 fresh random bytes.
pub fn generate_nonce() -> [u8; NONCE_LENGTH] {
    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

pub fn encode_nonce(nonce: &[u8; NONCE_LENGTH]) -> String {
    STANDARD.encode(nonce)
}

/// Decodes a base64 transport nonce; it must be exactly 32 bytes.
pub fn decode_nonce(encoded: &str) -> IntentsResult<[u8; NONCE_LENGTH]> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| IntentsError::InvalidInput(format!("Nonce is not valid base64: {}", e)))?;
    normalize_nonce(NonceInput::List(&bytes))
}

/// Normalizes a nonce input to exactly 32 bytes.
///
/// Text and byte inputs shorter than 32 bytes are left-padded with `'0'`;
/// anything longer is rejected. Lists must be exactly 32 bytes.
pub fn normalize_nonce(input: NonceInput<'_>) -> IntentsResult<[u8; NONCE_LENGTH]> {
    let bytes = match input {
        NonceInput::Text(text) => text.as_bytes(),
        NonceInput::Bytes(bytes) => bytes,
        NonceInput::List(list) => {
            if list.len() != NONCE_LENGTH {
                return Err(IntentsError::InvalidInput(format!(
                    "Invalid nonce length: expected {} bytes, got {}",
                    NONCE_LENGTH,
                    list.len()
                )));
            }
            list
        }
    };

    if bytes.len() > NONCE_LENGTH {
        return Err(IntentsError::InvalidInput(format!(
            "Invalid nonce length: {} bytes exceeds {}",
            bytes.len(),
            NONCE_LENGTH
        )));
    }

    let mut nonce = [NONCE_PAD; NONCE_LENGTH];
    nonce[NONCE_LENGTH - bytes.len()..].copy_from_slice(bytes);
    Ok(nonce)
}
