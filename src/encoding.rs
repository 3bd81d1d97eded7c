//! Canonical parameter encoding
//!
//! Parameters travel as `base64(json)`. The JSON is rendered from a
//! `BTreeMap`, so keys are always in byte order and the compact serde_json
//! formatting never varies. Both signing and verification go through
//! [`canonical_json`]; the verifier additionally signs the bytes it actually
//! received instead of re-rendering them.

use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name to value, always iterated in canonical (sorted) order
pub type ParameterSet = BTreeMap<String, FieldValue>;

/// A single parameter value as it appears in the JSON payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

impl FieldValue {
    /// The value as the gateway would print it
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            FieldValue::Text(s) => std::borrow::Cow::Borrowed(s),
            FieldValue::Integer(n) => std::borrow::Cow::Owned(n.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Integer(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

/// Base64 alphabet used on a given leg of the protocol
///
/// Requests are encoded and signed with the standard alphabet, notifications
/// with the URL-safe one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base64Alphabet {
    Standard,
    UrlSafe,
}

const STANDARD_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const URL_SAFE_DECODER: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

impl Base64Alphabet {
    /// Encode with padding
    pub fn encode(self, data: impl AsRef<[u8]>) -> String {
        match self {
            Base64Alphabet::Standard => general_purpose::STANDARD.encode(data),
            Base64Alphabet::UrlSafe => general_purpose::URL_SAFE.encode(data),
        }
    }

    /// Decode, accepting input with or without trailing padding
    pub fn decode(self, data: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            Base64Alphabet::Standard => STANDARD_DECODER.decode(data),
            Base64Alphabet::UrlSafe => URL_SAFE_DECODER.decode(data),
        }
    }
}

/// Render parameters as canonical JSON bytes
pub fn canonical_json(params: &ParameterSet) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(params)
}

/// Canonical JSON, base64 encoded with the standard alphabet
pub fn encode_parameters(params: &ParameterSet) -> Result<String, serde_json::Error> {
    Ok(Base64Alphabet::Standard.encode(canonical_json(params)?))
}

/// Parse a decoded JSON payload into a parameter set
///
/// The payload must be a flat object of string or integer values with no
/// repeated keys.
pub fn parse_parameters(json: &[u8]) -> Result<ParameterSet, serde_json::Error> {
    serde_json::from_slice::<StrictParameters>(json).map(|parsed| parsed.0)
}

struct StrictParameters(ParameterSet);

impl<'de> Deserialize<'de> for StrictParameters {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = StrictParameters;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a flat object of string or integer values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<StrictParameters, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut params = ParameterSet::new();
                while let Some(name) = map.next_key::<String>()? {
                    let value = match map.next_value::<serde_json::Value>()? {
                        serde_json::Value::String(s) => FieldValue::Text(s),
                        serde_json::Value::Number(n) => match n.as_i64() {
                            Some(n) => FieldValue::Integer(n),
                            None => {
                                return Err(de::Error::custom(format!(
                                    "field {} is not an integer: {}",
                                    name, n
                                )))
                            }
                        },
                        other => {
                            return Err(de::Error::custom(format!(
                                "field {} has unsupported value {}",
                                name, other
                            )))
                        }
                    };
                    if params.contains_key(&name) {
                        return Err(de::Error::custom(format!("duplicate field {}", name)));
                    }
                    params.insert(name, value);
                }
                Ok(StrictParameters(params))
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}
