//! Per-order key derivation
//!
//! The signing secret for a transaction is the order identifier encrypted
//! under the merchant master key:
//!
//! `3DES-EDE3-CBC(key = base64decode(master), iv = 0^8, data = zeropad8(order))`
//!
//! A signature leaked for one order is therefore useless for any other.

use cbc::cipher::{block_padding::NoPadding, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

use crate::types::{MerchantKey, OrderSecret, RawMasterKey};

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;

/// 3DES block size in bytes
pub const BLOCK_SIZE: usize = 8;

const ZERO_IV: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

#[derive(Debug, Error)]
pub enum KeyDerivationError {
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Invalid master key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
}

/// Derive the secret for `order_id` from a base64 encoded master key
pub fn derive_order_secret(
    master_key: &MerchantKey,
    order_id: &[u8],
) -> Result<OrderSecret, KeyDerivationError> {
    let raw = master_key.decode()?;
    derive_with_raw_key(&raw, order_id)
}

/// Derive the secret with an already decoded master key
pub fn derive_with_raw_key(
    key: &RawMasterKey,
    order_id: &[u8],
) -> Result<OrderSecret, KeyDerivationError> {
    let cipher = TdesCbcEnc::new_from_slices(key.as_slice(), &ZERO_IV).map_err(|_| {
        KeyDerivationError::InvalidKeyLength {
            expected: crate::types::MASTER_KEY_LEN,
            got: key.as_slice().len(),
        }
    })?;

    let padded = zero_pad(order_id);
    let ciphertext = cipher.encrypt_padded_vec_mut::<NoPadding>(&padded);
    Ok(OrderSecret::from_bytes(ciphertext))
}

// Null bytes up to the next block boundary; aligned input gets no extra block.
fn zero_pad(data: &[u8]) -> Vec<u8> {
    let rem = data.len() % BLOCK_SIZE;
    let mut padded = data.to_vec();
    if rem != 0 {
        padded.resize(data.len() + BLOCK_SIZE - rem, 0);
    }
    padded
}
