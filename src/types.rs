//! Zeroizing key material
//!
//! The merchant master key and the per-order secrets derived from it are
//! wrapped in types that clear their memory on drop.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::KeyDerivationError;

/// Length in bytes of a decoded 3DES (three key) master key
pub const MASTER_KEY_LEN: usize = 24;

/// Merchant master key as issued by the gateway (base64 text)
///
/// The HMAC protocol decodes it to 24 raw bytes before use. The legacy SHA-1
/// scheme appends the text itself to the signed string, so the original
/// encoding is kept verbatim.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MerchantKey(String);

impl MerchantKey {
    /// Wrap a base64 encoded master key
    pub fn new(encoded: impl Into<String>) -> Self {
        MerchantKey(encoded.into())
    }

    /// The key exactly as configured
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the key into raw 3DES key material
    pub fn decode(&self) -> Result<RawMasterKey, KeyDerivationError> {
        let bytes = BASE64.decode(self.0.trim())?;
        RawMasterKey::from_slice(&bytes)
    }
}

impl fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MerchantKey(<redacted>)")
    }
}

impl From<&str> for MerchantKey {
    fn from(value: &str) -> Self {
        MerchantKey::new(value)
    }
}

impl From<String> for MerchantKey {
    fn from(value: String) -> Self {
        MerchantKey::new(value)
    }
}

/// Decoded 24-byte master key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RawMasterKey([u8; MASTER_KEY_LEN]);

impl RawMasterKey {
    /// Create a raw key from a 24-byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyDerivationError> {
        if bytes.len() != MASTER_KEY_LEN {
            return Err(KeyDerivationError::InvalidKeyLength {
                expected: MASTER_KEY_LEN,
                got: bytes.len(),
            });
        }
        let mut key = [0u8; MASTER_KEY_LEN];
        key.copy_from_slice(bytes);
        Ok(RawMasterKey(key))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

/// Per-order signing secret derived from the master key
///
/// Its length is the order id length rounded up to the 8-byte 3DES block.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct OrderSecret(Vec<u8>);

impl OrderSecret {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        OrderSecret(bytes)
    }

    /// Parse a secret published in base64 form
    pub fn from_base64(encoded: &str) -> Result<Self, KeyDerivationError> {
        Ok(OrderSecret(BASE64.decode(encoded)?))
    }

    /// Base64 form, as exchanged in gateway test vectors
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for OrderSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderSecret({} bytes)", self.0.len())
    }
}
