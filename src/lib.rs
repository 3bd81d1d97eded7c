//! Signed requests and notifications for the Sermepa/Redsys card gateway
//!
//! A merchant posts a payment form whose parameters are JSON encoded,
//! base64 wrapped and signed with HMAC-SHA256 under a key derived per
//! order; the gateway answers with a notification signed the same way.
//! This crate builds the former and verifies the latter. Posting the form
//! is left to the caller.

pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod fields;
pub mod legacy;
pub mod notification;
pub mod prelude;
pub mod protocol;
pub mod request;
pub mod signature;
pub mod types;

pub use config::{Environment, MerchantConfig};
pub use crypto::{derive_order_secret, KeyDerivationError};
pub use encoding::{encode_parameters, Base64Alphabet, FieldValue, ParameterSet};
pub use error::{ErrorKind, SermepaError};
pub use fields::{is_allowed, locale_for_language, Direction};
pub use legacy::{legacy_signature, LegacyError};
pub use notification::{decode_notification, Notification, NotificationError};
pub use protocol::{FormFields, HmacSha256V1, LegacySha1, SignatureVersion, SigningScheme};
pub use request::{
    build_signed_request, sign_request, verify_signed_request, RequestError, RequestValue,
    SignedEnvelope, TransactionParams, TransactionParamsBuilder,
};
pub use signature::{sign_payload, verify_payload, SignatureError};
pub use types::{MerchantKey, OrderSecret};
