//! Sermepa prelude
//!
//! ```rust
//! use sermepa::prelude::*;
//!
//! let config = MerchantConfig::new("999008881", "Mk9m98IfEblmPfrpsawt7BmxObt98Jev");
//! let params = config
//!     .request()
//!     .amount(10i64)
//!     .sum_total(10i64)
//!     .order("2026A0001")
//!     .merchant_url("https://shop.example.com/notify")
//!     .build();
//! let form = config.sign_form(SignatureVersion::HmacSha256V1, &params)?;
//! assert_eq!(form.len(), 3);
//! # Ok::<(), SermepaError>(())
//! ```

pub use crate::config::{Environment, MerchantConfig};
pub use crate::encoding::{FieldValue, ParameterSet};
pub use crate::error::{ErrorKind, SermepaError};
pub use crate::fields::Direction;
pub use crate::notification::{decode_notification, Notification};
pub use crate::protocol::{FormFields, SignatureVersion, SigningScheme};
pub use crate::request::{
    build_signed_request, sign_request, verify_signed_request, SignedEnvelope, TransactionParams,
};
pub use crate::types::MerchantKey;
