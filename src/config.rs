//! Merchant configuration
//!
//! A [`MerchantConfig`] is the immutable, per-merchant input to every
//! operation: merchant code, terminal, master key and gateway environment.
//! It deserializes with serde, so it can live in whatever configuration
//! file format the application already uses.
//!
//! ```
//! use sermepa::{Environment, MerchantConfig};
//!
//! let config: MerchantConfig = serde_json::from_str(r#"{
//!     "merchant_code": "999008881",
//!     "terminal": "1",
//!     "secret_key": "Mk9m98IfEblmPfrpsawt7BmxObt98Jev",
//!     "environment": "test"
//! }"#)?;
//! assert_eq!(config.environment, Environment::Test);
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::encoding::ParameterSet;
use crate::error::SermepaError;
use crate::notification::{decode_notification_envelope, NotificationError};
use crate::protocol::{FormFields, SignatureVersion};
use crate::request::{
    sign_request, RequestError, SignedEnvelope, TransactionParams, TransactionParamsBuilder,
};
use crate::types::MerchantKey;

pub const PRODUCTION_ENDPOINT: &str = "https://sis.sermepa.es/sis/realizarPago";
pub const TEST_ENDPOINT: &str = "https://sis-t.sermepa.es:25443/sis/realizarPago";

/// Gateway environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Test,
}

impl Environment {
    /// Payment form endpoint
    pub fn endpoint(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_ENDPOINT,
            Environment::Test => TEST_ENDPOINT,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantConfig {
    pub merchant_code: String,
    #[serde(default)]
    pub terminal: Option<String>,
    /// Base64 master key issued by the gateway
    pub secret_key: String,
    #[serde(default)]
    pub environment: Environment,
    /// Overrides the environment's endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl fmt::Debug for MerchantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantConfig")
            .field("merchant_code", &self.merchant_code)
            .field("terminal", &self.terminal)
            .field("secret_key", &"<redacted>")
            .field("environment", &self.environment)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl MerchantConfig {
    pub fn new(merchant_code: impl Into<String>, secret_key: impl Into<String>) -> Self {
        MerchantConfig {
            merchant_code: merchant_code.into(),
            terminal: None,
            secret_key: secret_key.into(),
            environment: Environment::default(),
            endpoint: None,
        }
    }

    #[must_use]
    pub fn with_terminal(mut self, terminal: impl Into<String>) -> Self {
        self.terminal = Some(terminal.into());
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn key(&self) -> MerchantKey {
        MerchantKey::new(self.secret_key.as_str())
    }

    /// Where the transport should POST the form
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.environment.endpoint())
    }

    /// Start a request with merchant code and terminal filled in
    pub fn request(&self) -> TransactionParamsBuilder {
        let builder = TransactionParams::builder().merchant_code(self.merchant_code.as_str());
        match &self.terminal {
            Some(terminal) => builder.terminal(terminal.as_str()),
            None => builder,
        }
    }

    pub fn sign(&self, params: &TransactionParams) -> Result<SignedEnvelope, RequestError> {
        sign_request(&self.key(), params)
    }

    /// Sign with an explicitly chosen protocol generation
    pub fn sign_form(
        &self,
        version: SignatureVersion,
        params: &TransactionParams,
    ) -> Result<FormFields, SermepaError> {
        version.sign_form(&self.key(), params)
    }

    pub fn decode_notification(
        &self,
        envelope: &SignedEnvelope,
    ) -> Result<ParameterSet, NotificationError> {
        decode_notification_envelope(&self.key(), envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use rust_decimal_macros::dec;

    fn config() -> MerchantConfig {
        MerchantConfig::new("999008881", "Mk9m98IfEblmPfrpsawt7BmxObt98Jev")
            .with_terminal("871")
            .with_environment(Environment::Test)
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(Environment::default().endpoint(), PRODUCTION_ENDPOINT);
        assert_eq!(config().endpoint(), TEST_ENDPOINT);
        let custom = config().with_endpoint("https://gateway.internal/pay");
        assert_eq!(custom.endpoint(), "https://gateway.internal/pay");
    }

    #[test]
    fn test_deserialize_minimal() -> Result<(), serde_json::Error> {
        let config: MerchantConfig = serde_json::from_str(
            r#"{"merchant_code":"999008881","secret_key":"Mk9m98IfEblmPfrpsawt7BmxObt98Jev"}"#,
        )?;
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.terminal, None);
        Ok(())
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", config());
        assert!(rendered.contains("999008881"));
        assert!(!rendered.contains("Mk9m98"));
    }

    #[test]
    fn test_request_prefills_merchant() -> Result<(), RequestError> {
        let params = config()
            .request()
            .amount(dec!(1.45))
            .sum_total(dec!(1.45))
            .order("1447961844")
            .merchant_url("https://shop.example.com/notify")
            .build();
        let finalized = params.finalize()?;
        assert_eq!(finalized[fields::MERCHANT_CODE].as_text(), "999008881");
        assert_eq!(finalized[fields::MERCHANT_TERMINAL].as_text(), "871");

        // Same golden signature as a hand-built request
        let envelope = config().sign(&params)?;
        assert_eq!(
            envelope.signature,
            "sv+a7n7sljNdkBwb8j8ETakkGE3ajyhqz+YOI+WkH14="
        );
        Ok(())
    }
}
