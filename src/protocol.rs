//! Protocol generations
//!
//! Each signing generation implements [`SigningScheme`]; [`SignatureVersion`]
//! selects one explicitly. The two never share a code path.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::encoding::ParameterSet;
use crate::error::SermepaError;
use crate::legacy::{sign_legacy_form, verify_legacy_form};
use crate::notification::NotificationError;
use crate::request::{sign_request, verify_signed_request, SignedEnvelope, TransactionParams};
use crate::types::MerchantKey;

/// HTML form field name to value, as POSTed to the gateway
pub type FormFields = BTreeMap<String, String>;

/// A request signing protocol
pub trait SigningScheme {
    fn version(&self) -> SignatureVersion;

    /// Sign request parameters into the form fields to submit
    fn sign_form(
        &self,
        master_key: &MerchantKey,
        params: &TransactionParams,
    ) -> Result<FormFields, SermepaError>;

    /// Verify a signed form and return the request fields it carries
    fn verify_form(
        &self,
        master_key: &MerchantKey,
        form: &FormFields,
    ) -> Result<ParameterSet, SermepaError>;
}

/// JSON parameters in a versioned HMAC-SHA256 envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256V1;

impl SigningScheme for HmacSha256V1 {
    fn version(&self) -> SignatureVersion {
        SignatureVersion::HmacSha256V1
    }

    fn sign_form(
        &self,
        master_key: &MerchantKey,
        params: &TransactionParams,
    ) -> Result<FormFields, SermepaError> {
        Ok(sign_request(master_key, params)?.form_fields())
    }

    fn verify_form(
        &self,
        master_key: &MerchantKey,
        form: &FormFields,
    ) -> Result<ParameterSet, SermepaError> {
        let envelope = SignedEnvelope::from_form_fields(form)?;
        Ok(verify_signed_request(master_key, &envelope)?)
    }
}

/// Separate form fields signed with SHA-1 over a fixed concatenation
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySha1;

impl SigningScheme for LegacySha1 {
    fn version(&self) -> SignatureVersion {
        SignatureVersion::LegacySha1
    }

    fn sign_form(
        &self,
        master_key: &MerchantKey,
        params: &TransactionParams,
    ) -> Result<FormFields, SermepaError> {
        Ok(sign_legacy_form(master_key, params)?)
    }

    fn verify_form(
        &self,
        master_key: &MerchantKey,
        form: &FormFields,
    ) -> Result<ParameterSet, SermepaError> {
        Ok(verify_legacy_form(master_key, form)?)
    }
}

/// Known protocol generations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureVersion {
    #[default]
    HmacSha256V1,
    LegacySha1,
}

impl SignatureVersion {
    /// Tag as carried in `Ds_SignatureVersion`
    ///
    /// The legacy scheme has no wire tag; `"SHA1"` is only a label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureVersion::HmacSha256V1 => "HMAC_SHA256_V1",
            SignatureVersion::LegacySha1 => "SHA1",
        }
    }

    pub fn scheme(&self) -> &'static dyn SigningScheme {
        match self {
            SignatureVersion::HmacSha256V1 => &HmacSha256V1,
            SignatureVersion::LegacySha1 => &LegacySha1,
        }
    }

    pub fn sign_form(
        &self,
        master_key: &MerchantKey,
        params: &TransactionParams,
    ) -> Result<FormFields, SermepaError> {
        self.scheme().sign_form(master_key, params)
    }

    pub fn verify_form(
        &self,
        master_key: &MerchantKey,
        form: &FormFields,
    ) -> Result<ParameterSet, SermepaError> {
        self.scheme().verify_form(master_key, form)
    }
}

impl fmt::Display for SignatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureVersion {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HMAC_SHA256_V1" => Ok(SignatureVersion::HmacSha256V1),
            "SHA1" => Ok(SignatureVersion::LegacySha1),
            other => Err(NotificationError::UnsupportedVersion {
                found: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    const MASTER_KEY: &str = "Mk9m98IfEblmPfrpsawt7BmxObt98Jev";

    fn params() -> TransactionParams {
        TransactionParams::builder()
            .amount(dec!(20.00))
            .sum_total(dec!(20.00))
            .order("2026A0001")
            .merchant_code("999008881")
            .merchant_url("https://shop.example.com/notify")
            .build()
    }

    #[test]
    fn test_version_tags() -> Result<(), NotificationError> {
        assert_eq!(SignatureVersion::default().as_str(), "HMAC_SHA256_V1");
        assert_eq!(
            "HMAC_SHA256_V1".parse::<SignatureVersion>()?,
            SignatureVersion::HmacSha256V1
        );
        assert!("HMAC_SHA512_V2".parse::<SignatureVersion>().is_err());
        Ok(())
    }

    #[test]
    fn test_schemes_produce_different_forms() -> Result<(), SermepaError> {
        let key = MerchantKey::new(MASTER_KEY);
        let hmac = SignatureVersion::HmacSha256V1.sign_form(&key, &params())?;
        let legacy = SignatureVersion::LegacySha1.sign_form(&key, &params())?;

        assert_eq!(hmac.len(), 3);
        assert!(hmac.contains_key("Ds_MerchantParameters"));
        assert!(legacy.contains_key("Ds_Merchant_MerchantSignature"));
        assert!(!legacy.contains_key("Ds_Signature"));
        Ok(())
    }

    #[test]
    fn test_each_scheme_verifies_its_own_form() -> Result<(), SermepaError> {
        let key = MerchantKey::new(MASTER_KEY);
        for version in [SignatureVersion::HmacSha256V1, SignatureVersion::LegacySha1] {
            let form = version.sign_form(&key, &params())?;
            let verified = version.verify_form(&key, &form)?;
            assert_eq!(verified, params().finalize()?);
            assert_eq!(version.scheme().version(), version);
        }
        Ok(())
    }

    #[test]
    fn test_schemes_do_not_cross_verify() -> Result<(), SermepaError> {
        let key = MerchantKey::new(MASTER_KEY);
        let legacy = SignatureVersion::LegacySha1.sign_form(&key, &params())?;
        let err = SignatureVersion::HmacSha256V1
            .verify_form(&key, &legacy)
            .expect_err("legacy form has no envelope");
        assert_eq!(err.kind(), ErrorKind::MissingField);
        Ok(())
    }
}
