//! HMAC-SHA256 payload signatures
//!
//! The signature over an encoded parameter blob is
//! `base64(HMAC-SHA256(order_secret, encoded_parameters))`, where the MAC
//! input is the base64 text itself, not the JSON it decodes to.
//! Verification recomputes the signature and compares the base64 strings in
//! constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::encoding::Base64Alphabet;
use crate::types::OrderSecret;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("HMAC initialization failed")]
    InitFailed,

    #[error("Signature does not match payload")]
    BadSignature,
}

/// Raw HMAC-SHA256 over `data`
pub fn calculate_hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InitFailed)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Sign an encoded payload, returning the signature in the given alphabet
pub fn sign_payload(
    secret: &OrderSecret,
    payload: &[u8],
    alphabet: Base64Alphabet,
) -> Result<String, SignatureError> {
    let mac = calculate_hmac(secret.as_slice(), payload)?;
    Ok(alphabet.encode(mac))
}

/// Verify a signature over an encoded payload
///
/// Any difference, including a different alphabet or padding, is a
/// mismatch.
pub fn verify_payload(
    secret: &OrderSecret,
    payload: &[u8],
    signature: &str,
    alphabet: Base64Alphabet,
) -> Result<(), SignatureError> {
    let expected = sign_payload(secret, payload, alphabet)?;

    if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
        Ok(())
    } else {
        Err(SignatureError::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST_PAYLOAD: &str = concat!(
        "eyJEU19NRVJDSEFOVF9BTU9VTlQiOiIxNDUiLCJEU19NRVJDSEFOVF9PUkRFUiI6IjE0NDc5N",
        "jE4NDQiLCJEU19NRVJDSEFOVF9NRVJDSEFOVENPREUiOiI5OTkwMDg4ODEiLCJEU19NRVJDSE",
        "FOVF9DVVJSRU5DWSI6Ijk3OCIsIkRTX01FUkNIQU5UX1RSQU5TQUNUSU9OVFlQRSI6IjAiLCJ",
        "EU19NRVJDSEFOVF9URVJNSU5BTCI6Ijg3MSIsIkRTX01FUkNIQU5UX01FUkNIQU5UVVJMIjoi",
        "IiwiRFNfTUVSQ0hBTlRfVVJMT0siOiIiLCJEU19NRVJDSEFOVF9VUkxLTyI6IiJ9"
    );

    #[test]
    fn test_sign_request_vector() -> Result<(), Box<dyn std::error::Error>> {
        let secret = OrderSecret::from_base64("38t5Zm5RjlVHNycd8Nutcg==")?;
        let signature = sign_payload(&secret, REQUEST_PAYLOAD.as_bytes(), Base64Alphabet::Standard)?;
        assert_eq!(signature, "Ejse86yr96Xbr1mf6UvQLoTPwwTyFiLXM+2uT09i9nY=");
        Ok(())
    }

    #[test]
    fn test_sign_notification_vector_url_safe() -> Result<(), Box<dyn std::error::Error>> {
        let secret = OrderSecret::from_base64("1uGRHjGaVgg=")?;
        let signature = sign_payload(
            &secret,
            b"eyJEc19PcmRlciI6ICI2NjYifQ==",
            Base64Alphabet::UrlSafe,
        )?;
        assert_eq!(signature, "BskiXgq875tls56oClRVg72-ppcLpOSW0JUY9riQEKs=");
        Ok(())
    }

    #[test]
    fn test_verify_accepts_matching_signature() -> Result<(), Box<dyn std::error::Error>> {
        let secret = OrderSecret::from_base64("1uGRHjGaVgg=")?;
        verify_payload(
            &secret,
            b"eyJEc19PcmRlciI6ICI2NjYifQ==",
            "BskiXgq875tls56oClRVg72-ppcLpOSW0JUY9riQEKs=",
            Base64Alphabet::UrlSafe,
        )?;
        Ok(())
    }

    #[test]
    fn test_verify_rejects_wrong_alphabet() -> Result<(), Box<dyn std::error::Error>> {
        let secret = OrderSecret::from_base64("1uGRHjGaVgg=")?;
        let result = verify_payload(
            &secret,
            b"eyJEc19PcmRlciI6ICI2NjYifQ==",
            "BskiXgq875tls56oClRVg72-ppcLpOSW0JUY9riQEKs=",
            Base64Alphabet::Standard,
        );
        assert!(matches!(result, Err(SignatureError::BadSignature)));
        Ok(())
    }

    #[test]
    fn test_verify_rejects_flipped_bytes() -> Result<(), Box<dyn std::error::Error>> {
        let secret = OrderSecret::from_base64("38t5Zm5RjlVHNycd8Nutcg==")?;
        let payload = REQUEST_PAYLOAD.as_bytes();
        let signature = sign_payload(&secret, payload, Base64Alphabet::Standard)?;

        // First and last signature characters
        for idx in [0, signature.len() - 2] {
            let mut tampered = signature.clone().into_bytes();
            tampered[idx] = if tampered[idx] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(tampered)?;
            assert!(verify_payload(&secret, payload, &tampered, Base64Alphabet::Standard).is_err());
        }

        let mut tampered_payload = payload.to_vec();
        tampered_payload[10] ^= 0x01;
        assert!(matches!(
            verify_payload(&secret, &tampered_payload, &signature, Base64Alphabet::Standard),
            Err(SignatureError::BadSignature)
        ));
        Ok(())
    }

    #[test]
    fn test_verify_rejects_truncated_signature() -> Result<(), Box<dyn std::error::Error>> {
        let secret = OrderSecret::from_base64("1uGRHjGaVgg=")?;
        let result = verify_payload(
            &secret,
            b"eyJEc19PcmRlciI6ICI2NjYifQ==",
            "BskiXgq875tls56oClRVg72-ppcLpOSW0JUY9riQEKs",
            Base64Alphabet::UrlSafe,
        );
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_calculate_hmac_length() -> Result<(), SignatureError> {
        let mac = calculate_hmac(b"key", b"data")?;
        assert_eq!(mac.len(), 32);
        Ok(())
    }
}
