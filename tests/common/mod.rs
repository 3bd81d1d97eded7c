//! Shared vectors for sermepa integration tests
//!
//! Gateway vectors come from the processor's published back-to-back
//! examples; the golden request vector pins the canonical encoding.

#![allow(dead_code)]

use rust_decimal_macros::dec;
use sermepa::{Base64Alphabet, MerchantKey, TransactionParams};

/// Test-environment master key published by the gateway
pub const MASTER_KEY: &str = "Mk9m98IfEblmPfrpsawt7BmxObt98Jev";

pub const REQUEST_ORDER: &str = "1447961844";
pub const REQUEST_SECRET: &str = "38t5Zm5RjlVHNycd8Nutcg==";

/// Gateway's reference request payload (uppercase keys)
pub const REQUEST_PAYLOAD: &str = concat!(
    "eyJEU19NRVJDSEFOVF9BTU9VTlQiOiIxNDUiLCJEU19NRVJDSEFOVF9PUkRFUiI6IjE0NDc5N",
    "jE4NDQiLCJEU19NRVJDSEFOVF9NRVJDSEFOVENPREUiOiI5OTkwMDg4ODEiLCJEU19NRVJDSE",
    "FOVF9DVVJSRU5DWSI6Ijk3OCIsIkRTX01FUkNIQU5UX1RSQU5TQUNUSU9OVFlQRSI6IjAiLCJ",
    "EU19NRVJDSEFOVF9URVJNSU5BTCI6Ijg3MSIsIkRTX01FUkNIQU5UX01FUkNIQU5UVVJMIjoi",
    "IiwiRFNfTUVSQ0hBTlRfVVJMT0siOiIiLCJEU19NRVJDSEFOVF9VUkxLTyI6IiJ9"
);
pub const REQUEST_SIGNATURE: &str = "Ejse86yr96Xbr1mf6UvQLoTPwwTyFiLXM+2uT09i9nY=";

pub const NOTIFICATION_ORDER: &str = "666";
pub const NOTIFICATION_SECRET: &str = "1uGRHjGaVgg=";
pub const NOTIFICATION_PAYLOAD: &str = "eyJEc19PcmRlciI6ICI2NjYifQ==";
pub const NOTIFICATION_SIGNATURE: &str = "BskiXgq875tls56oClRVg72-ppcLpOSW0JUY9riQEKs=";

/// Full notification for order 1447961844, compact canonical JSON
pub const FULL_NOTIFICATION_PAYLOAD: &str = concat!(
    "eyJEc19BbW91bnQiOiIxNDUiLCJEc19BdXRob3Jpc2F0aW9uQ29kZSI6IjEyMzQ1NiIsIkRzX0Nh",
    "cmRfQ291bnRyeSI6IjcyNCIsIkRzX0NvbnN1bWVyTGFuZ3VhZ2UiOiIxIiwiRHNfQ3VycmVuY3ki",
    "OiI5NzgiLCJEc19EYXRlIjoiMTYvMTAvMjAyNiIsIkRzX0hvdXIiOiIxMjozMCIsIkRzX01lcmNo",
    "YW50Q29kZSI6Ijk5OTAwODg4MSIsIkRzX09yZGVyIjoiMTQ0Nzk2MTg0NCIsIkRzX1Jlc3BvbnNl",
    "IjoiMDAwMCIsIkRzX1NlY3VyZVBheW1lbnQiOiIxIiwiRHNfVGVybWluYWwiOiIxIiwiRHNfVHJh",
    "bnNhY3Rpb25UeXBlIjoiMCJ9"
);
pub const FULL_NOTIFICATION_SIGNATURE: &str = "nu3qMGOZlmCHAtFUugOTEuiD0tMIKkagTvWX112qWB4=";

pub const V1: &str = "HMAC_SHA256_V1";

pub fn key() -> MerchantKey {
    MerchantKey::new(MASTER_KEY)
}

/// A complete, valid request for order 1447961844
pub fn sample_request() -> TransactionParams {
    TransactionParams::builder()
        .amount(dec!(1.45))
        .sum_total(dec!(1.45))
        .order(REQUEST_ORDER)
        .merchant_code("999008881")
        .terminal("871")
        .merchant_url("https://shop.example.com/notify")
        .build()
}

/// Encode `json` URL-safe and sign it the way the gateway signs notifications
pub fn gateway_sign(json: &str, order: &str) -> (String, String) {
    let encoded = Base64Alphabet::UrlSafe.encode(json);
    let secret = sermepa::derive_order_secret(&key(), order.as_bytes())
        .expect("test master key is valid");
    let signature = sermepa::sign_payload(&secret, encoded.as_bytes(), Base64Alphabet::UrlSafe)
        .expect("HMAC accepts any key length");
    (encoded, signature)
}
