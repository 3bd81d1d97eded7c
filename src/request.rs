//! Signed payment requests
//!
//! A [`TransactionParams`] is an immutable set of `Ds_Merchant_*` fields.
//! Signing it applies the field policy (amounts to minor units, length
//! truncation, defaults), encodes the result canonically, derives the
//! order secret and returns the three form fields the gateway expects.
//!
//! # Example
//!
//! ```
//! use rust_decimal::Decimal;
//! use sermepa::{MerchantKey, TransactionParams, sign_request};
//!
//! let params = TransactionParams::builder()
//!     .amount(Decimal::new(145, 2))
//!     .sum_total(Decimal::new(145, 2))
//!     .order("1447961844")
//!     .merchant_code("999008881")
//!     .merchant_url("https://shop.example.com/notify")
//!     .build();
//!
//! let key = MerchantKey::new("Mk9m98IfEblmPfrpsawt7BmxObt98Jev");
//! let envelope = sign_request(&key, &params)?;
//! assert_eq!(envelope.signature_version, "HMAC_SHA256_V1");
//! # Ok::<(), sermepa::RequestError>(())
//! ```

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::crypto::{derive_order_secret, KeyDerivationError};
use crate::encoding::{encode_parameters, Base64Alphabet, FieldValue, ParameterSet};
use crate::fields::{self, Direction, FieldKind, FieldSpec, OUTBOUND_FIELDS};
use crate::notification::{open_envelope, NotificationError};
use crate::protocol::{FormFields, SignatureVersion};
use crate::signature::{sign_payload, SignatureError};
use crate::types::MerchantKey;

/// Form field carrying the signature version tag
pub const SIGNATURE_VERSION_FIELD: &str = "Ds_SignatureVersion";
/// Form field carrying the signature
pub const SIGNATURE_FIELD: &str = "Ds_Signature";
/// Form field carrying the encoded parameters
pub const MERCHANT_PARAMETERS_FIELD: &str = "Ds_MerchantParameters";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("The received parameter {name} is not allowed")]
    InvalidParameter { name: String },

    #[error("Missing mandatory field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Key derivation failed: {0}")]
    KeyDerivation(#[from] KeyDerivationError),

    #[error("Signing failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A request parameter before the field policy is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestValue {
    Text(String),
    Integer(i64),
    /// Exact decimal, used for amounts in major currency units
    Decimal(Decimal),
}

impl From<&str> for RequestValue {
    fn from(value: &str) -> Self {
        RequestValue::Text(value.to_string())
    }
}

impl From<String> for RequestValue {
    fn from(value: String) -> Self {
        RequestValue::Text(value)
    }
}

impl From<i64> for RequestValue {
    fn from(value: i64) -> Self {
        RequestValue::Integer(value)
    }
}

impl From<i32> for RequestValue {
    fn from(value: i32) -> Self {
        RequestValue::Integer(value.into())
    }
}

impl From<u32> for RequestValue {
    fn from(value: u32) -> Self {
        RequestValue::Integer(value.into())
    }
}

impl From<Decimal> for RequestValue {
    fn from(value: Decimal) -> Self {
        RequestValue::Decimal(value)
    }
}

impl From<NaiveDate> for RequestValue {
    fn from(value: NaiveDate) -> Self {
        RequestValue::Text(value.format("%Y-%m-%d").to_string())
    }
}

impl RequestValue {
    fn is_blank(&self) -> bool {
        matches!(self, RequestValue::Text(s) if s.is_empty())
    }

    fn to_text(&self) -> String {
        match self {
            RequestValue::Text(s) => s.clone(),
            RequestValue::Integer(n) => n.to_string(),
            RequestValue::Decimal(d) => d.to_string(),
        }
    }
}

/// Immutable, name-validated request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionParams {
    fields: BTreeMap<&'static str, RequestValue>,
}

impl TransactionParams {
    pub fn builder() -> TransactionParamsBuilder {
        TransactionParamsBuilder::default()
    }

    /// Build from arbitrary name/value pairs, rejecting unknown names
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<RequestValue>,
    {
        let mut builder = TransactionParamsBuilder::default();
        for (name, value) in pairs {
            builder = builder.param(name.as_ref(), value)?;
        }
        Ok(builder.build())
    }

    pub fn get(&self, name: &str) -> Option<&RequestValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Apply the field policy and return the exact set that gets signed
    ///
    /// Absent optional fields are omitted. Every value is rendered as a
    /// JSON string.
    pub fn finalize(&self) -> Result<ParameterSet, RequestError> {
        let mut out = ParameterSet::new();
        for spec in OUTBOUND_FIELDS {
            let value = match self.fields.get(spec.name) {
                // Blank values take the default when there is one
                Some(v) if !(spec.default.is_some() && v.is_blank()) => finalize_value(spec, v)?,
                _ => match spec.default {
                    Some(default) => {
                        debug!(field = spec.name, value = default, "Applying default");
                        default.to_string()
                    }
                    None if spec.mandatory => {
                        return Err(RequestError::MissingField { field: spec.name })
                    }
                    None => continue,
                },
            };
            out.insert(spec.name.to_string(), FieldValue::Text(value));
        }
        Ok(out)
    }
}

fn finalize_value(spec: &FieldSpec, value: &RequestValue) -> Result<String, RequestError> {
    match spec.kind {
        FieldKind::Amount => to_minor_units(spec.name, value).map(|n| n.to_string()),
        FieldKind::Text => Ok(truncate(spec, value.to_text())),
        FieldKind::Order => {
            let order = truncate(spec, value.to_text());
            validate_order(spec.name, &order)?;
            Ok(order)
        }
    }
}

fn truncate(spec: &FieldSpec, text: String) -> String {
    match spec.max_len {
        Some(max) if text.chars().count() > max => {
            debug!(field = spec.name, max, "Truncating field");
            text.chars().take(max).collect()
        }
        _ => text,
    }
}

// The gateway requires the first four characters to be digits.
fn validate_order(field: &'static str, order: &str) -> Result<(), RequestError> {
    let prefix_ok = order.chars().count() >= fields::ORDER_MIN_LEN
        && order
            .chars()
            .take(fields::ORDER_MIN_LEN)
            .all(|c| c.is_ascii_digit());
    if prefix_ok {
        Ok(())
    } else {
        Err(RequestError::InvalidValue {
            field,
            reason: format!(
                "order id {:?} must start with {} digits",
                order,
                fields::ORDER_MIN_LEN
            ),
        })
    }
}

/// Convert an amount in major units to truncated minor units (x100)
pub fn to_minor_units(field: &'static str, value: &RequestValue) -> Result<i64, RequestError> {
    let invalid = |reason: String| RequestError::InvalidValue { field, reason };

    let amount = match value {
        RequestValue::Decimal(d) => *d,
        RequestValue::Integer(n) => Decimal::from(*n),
        RequestValue::Text(s) => {
            Decimal::from_str(s.trim()).map_err(|e| invalid(format!("not a number: {}", e)))?
        }
    };
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid(format!("negative amount {}", amount)));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.trunc().to_i64())
        .ok_or_else(|| invalid(format!("amount {} out of range", amount)))
}

/// Builder for [`TransactionParams`]
///
/// Typed setters cover the common fields; [`param`](Self::param) accepts
/// any declared field by name.
#[derive(Debug, Clone, Default)]
pub struct TransactionParamsBuilder {
    fields: BTreeMap<&'static str, RequestValue>,
}

impl TransactionParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field by its gateway name
    pub fn param(
        mut self,
        name: &str,
        value: impl Into<RequestValue>,
    ) -> Result<Self, RequestError> {
        let spec = fields::outbound_spec(name).ok_or_else(|| RequestError::InvalidParameter {
            name: name.to_string(),
        })?;
        self.fields.insert(spec.name, value.into());
        Ok(self)
    }

    fn set(mut self, name: &'static str, value: impl Into<RequestValue>) -> Self {
        self.fields.insert(name, value.into());
        self
    }

    #[must_use]
    pub fn amount(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_AMOUNT, value)
    }

    #[must_use]
    pub fn sum_total(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_SUM_TOTAL, value)
    }

    #[must_use]
    pub fn currency(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_CURRENCY, value)
    }

    #[must_use]
    pub fn order(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_ORDER, value)
    }

    #[must_use]
    pub fn merchant_code(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_CODE, value)
    }

    #[must_use]
    pub fn terminal(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_TERMINAL, value)
    }

    #[must_use]
    pub fn transaction_type(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_TRANSACTION_TYPE, value)
    }

    #[must_use]
    pub fn merchant_url(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_URL, value)
    }

    #[must_use]
    pub fn url_ok(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_URL_OK, value)
    }

    #[must_use]
    pub fn url_ko(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_URL_KO, value)
    }

    #[must_use]
    pub fn product_description(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_PRODUCT_DESCRIPTION, value)
    }

    #[must_use]
    pub fn titular(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_TITULAR, value)
    }

    #[must_use]
    pub fn merchant_name(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_NAME, value)
    }

    #[must_use]
    pub fn consumer_language(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_CONSUMER_LANGUAGE, value)
    }

    #[must_use]
    pub fn merchant_data(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_DATA, value)
    }

    #[must_use]
    pub fn charge_expiry_date(self, value: impl Into<RequestValue>) -> Self {
        self.set(fields::MERCHANT_CHARGE_EXPIRY_DATE, value)
    }

    pub fn build(self) -> TransactionParams {
        TransactionParams {
            fields: self.fields,
        }
    }
}

/// The signed wire artifact: version tag, signature and encoded parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    #[serde(rename = "Ds_SignatureVersion")]
    pub signature_version: String,
    #[serde(rename = "Ds_Signature")]
    pub signature: String,
    #[serde(rename = "Ds_MerchantParameters")]
    pub merchant_parameters: String,
}

impl SignedEnvelope {
    /// The three HTML form fields to POST to the gateway
    pub fn form_fields(&self) -> FormFields {
        let mut form = FormFields::new();
        form.insert(
            SIGNATURE_VERSION_FIELD.to_string(),
            self.signature_version.clone(),
        );
        form.insert(SIGNATURE_FIELD.to_string(), self.signature.clone());
        form.insert(
            MERCHANT_PARAMETERS_FIELD.to_string(),
            self.merchant_parameters.clone(),
        );
        form
    }

    /// Read the envelope back from posted form fields
    pub fn from_form_fields(form: &FormFields) -> Result<Self, RequestError> {
        let field = |name: &'static str| {
            form.get(name)
                .cloned()
                .ok_or(RequestError::MissingField { field: name })
        };
        Ok(SignedEnvelope {
            signature_version: field(SIGNATURE_VERSION_FIELD)?,
            signature: field(SIGNATURE_FIELD)?,
            merchant_parameters: field(MERCHANT_PARAMETERS_FIELD)?,
        })
    }
}

/// Sign validated request parameters with the HMAC-SHA256 protocol
pub fn sign_request(
    master_key: &MerchantKey,
    params: &TransactionParams,
) -> Result<SignedEnvelope, RequestError> {
    let finalized = params.finalize()?;
    let merchant_parameters = encode_parameters(&finalized)?;

    let order = finalized
        .get(fields::MERCHANT_ORDER)
        .ok_or(RequestError::MissingField {
            field: fields::MERCHANT_ORDER,
        })?
        .as_text();
    let secret = derive_order_secret(master_key, order.as_bytes())?;
    let signature = sign_payload(
        &secret,
        merchant_parameters.as_bytes(),
        Base64Alphabet::Standard,
    )?;

    debug!(order = %order, "Signed payment request");

    Ok(SignedEnvelope {
        signature_version: SignatureVersion::HmacSha256V1.as_str().to_string(),
        signature,
        merchant_parameters,
    })
}

/// Validate a raw name/value mapping and sign it
pub fn build_signed_request<I, K, V>(
    master_key: &MerchantKey,
    params: I,
) -> Result<SignedEnvelope, RequestError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<RequestValue>,
{
    let params = TransactionParams::from_pairs(params)?;
    sign_request(master_key, &params)
}

/// Verify an outbound envelope and return its parameters
///
/// Runs the same checks as notification decoding, against the request
/// field set and the standard base64 alphabet.
pub fn verify_signed_request(
    master_key: &MerchantKey,
    envelope: &SignedEnvelope,
) -> Result<ParameterSet, NotificationError> {
    open_envelope(
        master_key,
        &envelope.merchant_parameters,
        &envelope.signature,
        &envelope.signature_version,
        Direction::Outbound,
        Base64Alphabet::Standard,
    )
}
