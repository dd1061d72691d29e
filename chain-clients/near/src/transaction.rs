//! Borsh-encoded NEAR transactions
//!
//! Field order and enum tags follow the protocol's `Transaction` (v0) layout:
//! the signature covers `sha256(borsh(transaction))`.

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use std::io::{Result as IoResult, Write};

use crate::keys::NearSecretKey;

/// Key type tag for ed25519 in public keys and signatures.
const KEY_TYPE_ED25519: u8 = 0;

/// Tag of `FunctionCall` within the protocol's `Action` enum.
const ACTION_FUNCTION_CALL: u8 = 2;

/// ed25519 public key as serialized inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(pub [u8; 32]);

impl BorshSerialize for PublicKey {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_all(&[KEY_TYPE_ED25519])?;
        writer.write_all(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct FunctionCallAction {
    pub method_name: String,
    pub args: Vec<u8>,
    pub gas: u64,
    pub deposit: u128,
}

/// Subset of transaction actions this client submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FunctionCall(FunctionCallAction),
}

impl BorshSerialize for Action {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        match self {
            Action::FunctionCall(call) => {
                writer.write_all(&[ACTION_FUNCTION_CALL])?;
                call.serialize(writer)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct Transaction {
    pub signer_id: String,
    pub public_key: PublicKey,
    pub nonce: u64,
    pub receiver_id: String,
    pub block_hash: [u8; 32],
    pub actions: Vec<Action>,
}

impl Transaction {
    /// SHA-256 of the borsh encoding; this is what gets signed.
    pub fn hash(&self) -> IoResult<[u8; 32]> {
        let bytes = self.try_to_vec()?;
        Ok(Sha256::digest(&bytes).into())
    }

    /// Signs the transaction with `key`.
    pub fn sign(self, key: &NearSecretKey) -> IoResult<SignedTransaction> {
        let hash = self.hash()?;
        let signature = key.sign(&hash);
        Ok(SignedTransaction {
            transaction: self,
            signature,
            hash,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: [u8; 64],
    /// Transaction hash (also the id reported by the RPC, base58-encoded).
    pub hash: [u8; 32],
}

impl BorshSerialize for SignedTransaction {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.transaction.serialize(writer)?;
        writer.write_all(&[KEY_TYPE_ED25519])?;
        writer.write_all(&self.signature)
    }
}
