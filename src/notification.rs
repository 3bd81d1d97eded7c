//! Gateway notification decoding
//!
//! The gateway reports the outcome of a payment by posting the same three
//! fields a request carries. Decoding is a linear sequence of checks, each
//! failing with its own error:
//!
//! 1. version tag is `HMAC_SHA256_V1`
//! 2. parameters are URL-safe base64
//! 3. the decoded bytes are a flat JSON object
//! 4. an order id is present (`Ds_Order` or `DS_ORDER`)
//! 5. the order secret is derived from the master key
//! 6. the signature matches the bytes as received
//! 7. every field is known, uppercase names are mapped to canonical case
//!
//! The signature is checked before any field validation so a tampered
//! payload never reaches the schema checks.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;
use thiserror::Error;
use tracing::{debug, warn};

use crate::crypto::{derive_order_secret, KeyDerivationError};
use crate::encoding::{parse_parameters, Base64Alphabet, ParameterSet};
use crate::fields::{self, Direction};
use crate::protocol::SignatureVersion;
use crate::request::SignedEnvelope;
use crate::signature::{verify_payload, SignatureError};
use crate::types::MerchantKey;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Unsupported signature version: {found}")]
    UnsupportedVersion { found: String },

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Payload carries no order field")]
    MissingOrderField,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(#[from] KeyDerivationError),

    #[error("Signature verification failed")]
    BadSignature,

    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    #[error("Signature error: {0}")]
    Signature(SignatureError),
}

impl From<SignatureError> for NotificationError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::BadSignature => NotificationError::BadSignature,
            other => NotificationError::Signature(other),
        }
    }
}

/// Decode and verify a gateway notification
///
/// Returns the notification fields with canonical names.
pub fn decode_notification(
    master_key: &MerchantKey,
    merchant_parameters: &str,
    signature: &str,
    signature_version: &str,
) -> Result<ParameterSet, NotificationError> {
    let params = open_envelope(
        master_key,
        merchant_parameters,
        signature,
        signature_version,
        Direction::Inbound,
        Base64Alphabet::UrlSafe,
    )?;
    debug!(fields = params.len(), "Notification verified");
    Ok(params)
}

/// [`decode_notification`] over an already collected envelope
pub fn decode_notification_envelope(
    master_key: &MerchantKey,
    envelope: &SignedEnvelope,
) -> Result<ParameterSet, NotificationError> {
    decode_notification(
        master_key,
        &envelope.merchant_parameters,
        &envelope.signature,
        &envelope.signature_version,
    )
}

pub(crate) fn open_envelope(
    master_key: &MerchantKey,
    merchant_parameters: &str,
    signature: &str,
    signature_version: &str,
    direction: Direction,
    alphabet: Base64Alphabet,
) -> Result<ParameterSet, NotificationError> {
    if signature_version != SignatureVersion::HmacSha256V1.as_str() {
        return Err(NotificationError::UnsupportedVersion {
            found: signature_version.to_string(),
        });
    }

    let json = alphabet.decode(merchant_parameters)?;
    let parsed =
        parse_parameters(&json).map_err(|e| NotificationError::MalformedPayload(e.to_string()))?;

    let order = find_order(&parsed, direction).ok_or(NotificationError::MissingOrderField)?;
    let secret = derive_order_secret(master_key, order.as_bytes())?;

    if let Err(err) = verify_payload(&secret, merchant_parameters.as_bytes(), signature, alphabet)
    {
        warn!(order = %order, "Signature mismatch");
        return Err(err.into());
    }

    normalize(parsed, direction)
}

// Exact canonical key first, then its all-uppercase form; nothing else.
fn find_order(params: &ParameterSet, direction: Direction) -> Option<String> {
    let name = fields::order_field(direction);
    params
        .get(name)
        .or_else(|| params.get(&name.to_ascii_uppercase()))
        .map(|value| value.as_text().into_owned())
}

fn normalize(parsed: ParameterSet, direction: Direction) -> Result<ParameterSet, NotificationError> {
    let mut out = ParameterSet::new();
    for (name, value) in parsed {
        let canonical = if fields::is_allowed(direction, &name) {
            name
        } else if let Some(canonical) = fields::canonical_name(direction, &name) {
            canonical.to_string()
        } else {
            warn!(parameter = %name, "Unknown parameter in payload");
            return Err(NotificationError::UnknownParameter { name });
        };

        if out.contains_key(&canonical) {
            return Err(NotificationError::MalformedPayload(format!(
                "field {} appears in more than one casing",
                canonical
            )));
        }
        out.insert(canonical, value);
    }
    Ok(out)
}

/// Typed view over verified notification fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    params: ParameterSet,
}

impl Notification {
    /// Decode, verify and wrap a notification
    pub fn decode(
        master_key: &MerchantKey,
        envelope: &SignedEnvelope,
    ) -> Result<Self, NotificationError> {
        decode_notification_envelope(master_key, envelope).map(Self::from_parameters)
    }

    pub fn from_parameters(params: ParameterSet) -> Self {
        Notification { params }
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn into_parameters(self) -> ParameterSet {
        self.params
    }

    pub fn get(&self, name: &str) -> Option<Cow<'_, str>> {
        self.params.get(name).map(|v| v.as_text())
    }

    pub fn order(&self) -> Option<Cow<'_, str>> {
        self.get(fields::DS_ORDER)
    }

    /// Numeric `Ds_Response` code
    pub fn response_code(&self) -> Option<u16> {
        self.get(fields::DS_RESPONSE)?.trim().parse().ok()
    }

    /// Response codes 0000 to 0099 mean the payment was authorized
    pub fn is_authorized(&self) -> bool {
        matches!(self.response_code(), Some(code) if code <= 99)
    }

    pub fn amount_minor_units(&self) -> Option<i64> {
        self.get(fields::DS_AMOUNT)?.trim().parse().ok()
    }

    /// Locale tag for `Ds_ConsumerLanguage`
    pub fn locale(&self) -> Option<&'static str> {
        fields::locale_for_language(&self.get(fields::DS_CONSUMER_LANGUAGE)?)
    }

    /// Gateway-local time of the operation (`Ds_Date` + `Ds_Hour`)
    ///
    /// Values may arrive percent-encoded (`16%2F10%2F2026`, `12%3A30`).
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let date = unescape(&self.get(fields::DS_DATE)?);
        let hour = unescape(&self.get(fields::DS_HOUR)?);
        let date = NaiveDate::parse_from_str(&date, "%d/%m/%Y").ok()?;
        let time = NaiveTime::parse_from_str(&hour, "%H:%M").ok()?;
        Some(date.and_time(time))
    }
}

fn unescape(value: &str) -> String {
    value
        .replace("%2F", "/")
        .replace("%2f", "/")
        .replace("%3A", ":")
        .replace("%3a", ":")
}
