//! Unified error type for the public API
//!
//! Each module keeps its own error enum for precise handling; this type
//! collects them and exposes a flat [`ErrorKind`] so callers can tell a
//! forged payload (`BadSignature`) from protocol drift (`UnknownParameter`)
//! without matching on nested variants.
//!
//! # Example
//!
//! ```
//! use sermepa::{decode_notification, ErrorKind, MerchantKey, SermepaError};
//!
//! let key = MerchantKey::new("Mk9m98IfEblmPfrpsawt7BmxObt98Jev");
//! let err: SermepaError = decode_notification(
//!     &key,
//!     "eyJEc19PcmRlciI6ICI2NjYifQ==",
//!     "AAAA",
//!     "HMAC_SHA256_V1",
//! )
//! .unwrap_err()
//! .into();
//! assert_eq!(err.kind(), ErrorKind::BadSignature);
//! ```

use thiserror::Error;

use crate::crypto::KeyDerivationError;
use crate::legacy::LegacyError;
use crate::notification::NotificationError;
use crate::request::RequestError;
use crate::signature::SignatureError;

#[derive(Debug, Error)]
pub enum SermepaError {
    /// Request validation or signing error
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Notification (or request envelope) verification error
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Master key decoding error
    #[error("Key error: {0}")]
    Key(#[from] KeyDerivationError),

    /// HMAC error
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Legacy SHA-1 scheme error
    #[error("Legacy error: {0}")]
    Legacy(#[from] LegacyError),
}

/// Flat classification of every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidParameter,
    MissingField,
    InvalidValue,
    KeyDerivation,
    UnsupportedVersion,
    Base64Decode,
    MalformedPayload,
    MissingOrderField,
    BadSignature,
    UnknownParameter,
    Internal,
}

impl ErrorKind {
    /// Stable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter => "SERMEPA_E_PARAM_NOT_ALLOWED",
            ErrorKind::MissingField => "SERMEPA_E_FIELD_MISSING",
            ErrorKind::InvalidValue => "SERMEPA_E_FIELD_INVALID",
            ErrorKind::KeyDerivation => "SERMEPA_E_KEY_INVALID",
            ErrorKind::UnsupportedVersion => "SERMEPA_E_VERSION_UNSUPPORTED",
            ErrorKind::Base64Decode => "SERMEPA_E_BASE64",
            ErrorKind::MalformedPayload => "SERMEPA_E_PAYLOAD_MALFORMED",
            ErrorKind::MissingOrderField => "SERMEPA_E_ORDER_MISSING",
            ErrorKind::BadSignature => "SERMEPA_E_SIGNATURE_MISMATCH",
            ErrorKind::UnknownParameter => "SERMEPA_E_PARAM_UNKNOWN",
            ErrorKind::Internal => "SERMEPA_E_INTERNAL",
        }
    }
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            RequestError::MissingField { .. } => ErrorKind::MissingField,
            RequestError::InvalidValue { .. } => ErrorKind::InvalidValue,
            RequestError::KeyDerivation(_) => ErrorKind::KeyDerivation,
            RequestError::Signature(e) => e.kind(),
            RequestError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

impl NotificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotificationError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            NotificationError::Base64Decode(_) => ErrorKind::Base64Decode,
            NotificationError::MalformedPayload(_) => ErrorKind::MalformedPayload,
            NotificationError::MissingOrderField => ErrorKind::MissingOrderField,
            NotificationError::KeyDerivation(_) => ErrorKind::KeyDerivation,
            NotificationError::BadSignature => ErrorKind::BadSignature,
            NotificationError::UnknownParameter { .. } => ErrorKind::UnknownParameter,
            NotificationError::Signature(e) => e.kind(),
        }
    }
}

impl SignatureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignatureError::InitFailed => ErrorKind::Internal,
            SignatureError::BadSignature => ErrorKind::BadSignature,
        }
    }
}

impl LegacyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LegacyError::Request(e) => e.kind(),
            LegacyError::MissingSignature => ErrorKind::MissingField,
            LegacyError::BadSignature => ErrorKind::BadSignature,
        }
    }
}

impl SermepaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Request(e) => e.kind(),
            Self::Notification(e) => e.kind(),
            Self::Key(_) => ErrorKind::KeyDerivation,
            Self::Signature(e) => e.kind(),
            Self::Legacy(e) => e.kind(),
        }
    }

    /// Returns a stable error code for programmatic error handling
    ///
    /// Codes follow the format `SERMEPA_E_<CATEGORY>_<SPECIFIC>`.
    pub fn error_code(&self) -> &'static str {
        self.kind().error_code()
    }

    /// Always false: every failure here is deterministic for its input.
    /// Retrying belongs to the transport that posts the form.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// True when the payload may have been tampered with
    pub fn is_signature_error(&self) -> bool {
        self.kind() == ErrorKind::BadSignature
    }

    /// True for schema violations (unknown, missing or invalid fields)
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidParameter
                | ErrorKind::UnknownParameter
                | ErrorKind::MissingField
                | ErrorKind::InvalidValue
                | ErrorKind::MissingOrderField
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let bad_sig = SermepaError::Notification(NotificationError::BadSignature);
        assert!(bad_sig.is_signature_error());
        assert!(!bad_sig.is_schema_error());
        assert!(!bad_sig.is_retryable());

        let unknown = SermepaError::Notification(NotificationError::UnknownParameter {
            name: "Ds_Extra".to_string(),
        });
        assert!(unknown.is_schema_error());
        assert!(!unknown.is_signature_error());
        assert_ne!(bad_sig.kind(), unknown.kind());
    }

    #[test]
    fn test_nested_kinds_flatten() {
        let legacy = SermepaError::Legacy(LegacyError::Request(RequestError::InvalidParameter {
            name: "Ds_Merchant_Foo".to_string(),
        }));
        assert_eq!(legacy.kind(), ErrorKind::InvalidParameter);

        let hmac = SermepaError::Request(RequestError::Signature(SignatureError::BadSignature));
        assert_eq!(hmac.kind(), ErrorKind::BadSignature);
    }

    #[test]
    fn test_error_display_and_codes() {
        let err = SermepaError::Request(RequestError::InvalidParameter {
            name: "Ds_Merchant_Foo".to_string(),
        });
        assert!(err.to_string().contains("Ds_Merchant_Foo is not allowed"));
        assert_eq!(err.error_code(), "SERMEPA_E_PARAM_NOT_ALLOWED");

        let err = SermepaError::Notification(NotificationError::MissingOrderField);
        assert_eq!(err.error_code(), "SERMEPA_E_ORDER_MISSING");
    }
}
