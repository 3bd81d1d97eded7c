//! Legacy SHA-1 request signatures
//!
//! The first generation of the gateway protocol posted every field
//! separately and signed a fixed concatenation:
//!
//! `HEX_UPPER(SHA1(amount || order || merchant_code || currency || transaction_type || merchant_url || key))`
//!
//! where `key` is the configured key text, not a derived secret. The scheme
//! has no version tag and no per-order key, so it lives apart from the
//! envelope code path and is only selected explicitly.

use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};

use crate::encoding::{FieldValue, ParameterSet};
use crate::fields::{self, Direction};
use crate::protocol::FormFields;
use crate::request::{RequestError, TransactionParams};
use crate::types::MerchantKey;

/// Fields entering the signature, in signing order
pub const SIGNED_FIELDS: [&str; 6] = [
    fields::MERCHANT_AMOUNT,
    fields::MERCHANT_ORDER,
    fields::MERCHANT_CODE,
    fields::MERCHANT_CURRENCY,
    fields::MERCHANT_TRANSACTION_TYPE,
    fields::MERCHANT_URL,
];

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Form carries no {} field", fields::MERCHANT_SIGNATURE)]
    MissingSignature,

    #[error("Signature verification failed")]
    BadSignature,
}

/// Compute the SHA-1 signature over finalized request fields
pub fn legacy_signature(
    master_key: &MerchantKey,
    finalized: &ParameterSet,
) -> Result<String, LegacyError> {
    let mut hasher = Sha1::new();
    for name in SIGNED_FIELDS {
        let value = finalized
            .get(name)
            .ok_or(RequestError::MissingField { field: name })?;
        hasher.update(value.as_text().as_bytes());
    }
    hasher.update(master_key.as_str().as_bytes());
    Ok(hex::encode_upper(hasher.finalize()))
}

/// Build the legacy form: every finalized field plus the signature
pub fn sign_legacy_form(
    master_key: &MerchantKey,
    params: &TransactionParams,
) -> Result<FormFields, LegacyError> {
    let finalized = params.finalize()?;
    let signature = legacy_signature(master_key, &finalized)?;

    let mut form: FormFields = finalized
        .into_iter()
        .map(|(name, value)| (name, value.to_string()))
        .collect();
    form.insert(fields::MERCHANT_SIGNATURE.to_string(), signature);

    debug!(fields = form.len(), "Signed legacy request form");
    Ok(form)
}

/// Verify a legacy form and return its request fields
pub fn verify_legacy_form(
    master_key: &MerchantKey,
    form: &FormFields,
) -> Result<ParameterSet, LegacyError> {
    let signature = form
        .get(fields::MERCHANT_SIGNATURE)
        .ok_or(LegacyError::MissingSignature)?;

    let mut params = ParameterSet::new();
    for (name, value) in form {
        if name == fields::MERCHANT_SIGNATURE {
            continue;
        }
        if !fields::is_allowed(Direction::Outbound, name) {
            return Err(RequestError::InvalidParameter { name: name.clone() }.into());
        }
        params.insert(name.clone(), FieldValue::Text(value.clone()));
    }

    let expected = legacy_signature(master_key, &params)?;
    // Hex digests compare case-insensitively
    let supplied = signature.to_ascii_uppercase();
    if expected.as_bytes().ct_eq(supplied.as_bytes()).into() {
        Ok(params)
    } else {
        warn!("Legacy signature mismatch");
        Err(LegacyError::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const LEGACY_KEY: &str = "qwertyasdf0123456789";

    fn params() -> TransactionParams {
        TransactionParams::builder()
            .amount(dec!(1.45))
            .sum_total(dec!(1.45))
            .order("1447961844")
            .merchant_code("999008881")
            .merchant_url("https://shop.example.com/notify")
            .build()
    }

    #[test]
    fn test_legacy_signature_vector() -> Result<(), LegacyError> {
        let finalized = params().finalize()?;
        let signature = legacy_signature(&MerchantKey::new(LEGACY_KEY), &finalized)?;
        assert_eq!(signature, "DED63323E9C05B335461FCCB85ABAB55D418E644");
        Ok(())
    }

    #[test]
    fn test_legacy_form_contents() -> Result<(), LegacyError> {
        let form = sign_legacy_form(&MerchantKey::new(LEGACY_KEY), &params())?;
        assert_eq!(form["Ds_Merchant_Amount"], "145");
        assert_eq!(form["Ds_Merchant_Currency"], "978");
        assert_eq!(form["Ds_Merchant_TransactionType"], "0");
        assert_eq!(
            form["Ds_Merchant_MerchantSignature"],
            "DED63323E9C05B335461FCCB85ABAB55D418E644"
        );
        assert!(!form.contains_key("Ds_MerchantParameters"));
        Ok(())
    }

    #[test]
    fn test_legacy_verify_roundtrip() -> Result<(), LegacyError> {
        let key = MerchantKey::new(LEGACY_KEY);
        let form = sign_legacy_form(&key, &params())?;
        let verified = verify_legacy_form(&key, &form)?;
        assert_eq!(verified, params().finalize()?);
        Ok(())
    }

    #[test]
    fn test_legacy_verify_detects_tampering() -> Result<(), LegacyError> {
        let key = MerchantKey::new(LEGACY_KEY);
        let mut form = sign_legacy_form(&key, &params())?;
        form.insert("Ds_Merchant_Amount".to_string(), "1".to_string());
        assert!(matches!(
            verify_legacy_form(&key, &form),
            Err(LegacyError::BadSignature)
        ));

        let form = sign_legacy_form(&key, &params())?;
        assert!(matches!(
            verify_legacy_form(&MerchantKey::new("other-key"), &form),
            Err(LegacyError::BadSignature)
        ));
        Ok(())
    }

    #[test]
    fn test_legacy_verify_missing_signature() {
        let form = FormFields::new();
        assert!(matches!(
            verify_legacy_form(&MerchantKey::new(LEGACY_KEY), &form),
            Err(LegacyError::MissingSignature)
        ));
    }

    #[test]
    fn test_legacy_uses_key_text_not_decoded_key() -> Result<(), LegacyError> {
        // Any text works as a legacy key, base64 or not
        let finalized = params().finalize()?;
        let a = legacy_signature(&MerchantKey::new("not base64 at all"), &finalized)?;
        let b = legacy_signature(&MerchantKey::new("not base64 at all!"), &finalized)?;
        assert_ne!(a, b);
        assert_eq!(a.len(), 40);
        Ok(())
    }
}
