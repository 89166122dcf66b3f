//! Request signing for the Kalshi trade API
//!
//! Kalshi authenticates each REST call with an RSA signature over the
//! canonical payload `{timestamp}{METHOD}{path}`. Production keys are
//! PKCS#8 and expect RSA-PSS padding; older demo keys ship as PKCS#1 and
//! some only accept PKCS#1 v1.5 padding. Key material arrives as base64
//! in an unknown one of those containers, so signing tries each encoding
//! and padding combination in order and uses the first that works.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use thiserror::Error;

/// Fixed API prefix every canonical path must carry
const API_PREFIX: &str = "/trade-api/v2";

/// Authentication failures
///
/// Deliberately coarse: the error never says which encoding or padding
/// attempt failed, so a caller relaying it cannot be used as an oracle.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Key material missing or too short to be a real key
    #[error("private key material is empty or truncated")]
    EmptyKey,
    /// No encoding/padding combination produced a signature
    #[error("cryptographic mismatch: private key did not produce a valid signature")]
    CryptoMismatch,
}

/// Build the canonical signing payload for a request.
///
/// The query string is discarded, the API prefix is enforced, and repeated
/// separators are collapsed. Timestamp, method, and path are concatenated
/// with no delimiter.
pub fn canonical_payload(method: &str, path: &str, timestamp_ms: i64) -> String {
    let method = method.to_uppercase();

    let mut path = path.split('?').next().unwrap_or("").to_string();
    if !path.starts_with(API_PREFIX) {
        if path.starts_with('/') {
            path = format!("{API_PREFIX}{path}");
        } else {
            path = format!("{API_PREFIX}/{path}");
        }
    }
    let path = collapse_slashes(&path);

    format!("{timestamp_ms}{method}{path}")
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Recover raw DER bytes from pasted key material.
///
/// Strips PEM armor lines and any whitespace/stray characters, leaving
/// only the base64 alphabet, then decodes.
fn key_der(material: &str) -> Result<Vec<u8>, AuthError> {
    let base64_only: String = material
        .lines()
        .filter(|line| !line.contains("-----"))
        .collect::<Vec<_>>()
        .join("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();

    BASE64
        .decode(base64_only.as_bytes())
        .map_err(|_| AuthError::CryptoMismatch)
}

/// Sign a request, producing a base64 signature string.
///
/// Tries PKCS#8 then PKCS#1 key decoding; for each decoded key, RSA-PSS
/// (SHA-256, salt length = digest length) first, then PKCS#1 v1.5 as a
/// compatibility fallback. Never logs key material.
pub fn sign_request(
    method: &str,
    path: &str,
    timestamp_ms: i64,
    private_key: &str,
) -> Result<String, AuthError> {
    let trimmed = private_key.trim();
    if trimmed.len() < 32 {
        return Err(AuthError::EmptyKey);
    }

    let payload = canonical_payload(method, path, timestamp_ms);
    let der = key_der(trimmed)?;

    let candidates = [
        RsaPrivateKey::from_pkcs8_der(&der).ok(),
        RsaPrivateKey::from_pkcs1_der(&der).ok(),
    ];

    for key in candidates.into_iter().flatten() {
        if let Some(sig) = try_sign(&key, payload.as_bytes()) {
            return Ok(BASE64.encode(sig));
        }
    }

    Err(AuthError::CryptoMismatch)
}

fn try_sign(key: &RsaPrivateKey, payload: &[u8]) -> Option<Vec<u8>> {
    // PSS salt length defaults to the SHA-256 digest length (32)
    let pss = rsa::pss::SigningKey::<Sha256>::new(key.clone());
    if let Ok(sig) = pss.try_sign_with_rng(&mut rand::thread_rng(), payload) {
        return Some(sig.to_vec());
    }

    let pkcs1v15 = rsa::pkcs1v15::SigningKey::<Sha256>::new(key.clone());
    if let Ok(sig) = pkcs1v15.try_sign(payload) {
        return Some(sig.to_vec());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::EncodeRsaPrivateKey;
    use rsa::pkcs8::EncodePrivateKey;
    use rsa::signature::Verifier;
    use rsa::RsaPublicKey;

    fn test_key() -> RsaPrivateKey {
        // 1024 bits keeps the test fast; signing semantics are identical
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap()
    }

    #[test]
    fn test_canonical_payload_adds_prefix() {
        let payload = canonical_payload("get", "/portfolio/balance", 1700000000000);
        assert_eq!(payload, "1700000000000GET/trade-api/v2/portfolio/balance");
    }

    #[test]
    fn test_canonical_payload_keeps_existing_prefix() {
        let payload = canonical_payload("GET", "/trade-api/v2/markets", 42);
        assert_eq!(payload, "42GET/trade-api/v2/markets");
    }

    #[test]
    fn test_canonical_payload_strips_query() {
        let payload = canonical_payload("GET", "/markets?status=open&limit=50", 42);
        assert_eq!(payload, "42GET/trade-api/v2/markets");
    }

    #[test]
    fn test_canonical_payload_collapses_slashes() {
        let payload = canonical_payload("DELETE", "//portfolio//orders/abc", 7);
        assert_eq!(payload, "7DELETE/trade-api/v2/portfolio/orders/abc");
    }

    #[test]
    fn test_canonical_payload_relative_path() {
        let payload = canonical_payload("post", "portfolio/orders", 1);
        assert_eq!(payload, "1POST/trade-api/v2/portfolio/orders");
    }

    #[test]
    fn test_sign_rejects_empty_key() {
        let err = sign_request("GET", "/markets", 1, "").unwrap_err();
        assert!(matches!(err, AuthError::EmptyKey));
    }

    #[test]
    fn test_sign_rejects_garbage_key() {
        let garbage = "A".repeat(64);
        let err = sign_request("GET", "/markets", 1, &garbage).unwrap_err();
        assert!(matches!(err, AuthError::CryptoMismatch));
    }

    #[test]
    fn test_sign_with_pkcs8_pem() {
        let key = test_key();
        let pem = key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF).unwrap();

        let sig_b64 = sign_request("GET", "/portfolio/balance", 1700000000000, &pem).unwrap();
        let sig_bytes = BASE64.decode(sig_b64).unwrap();

        // Production padding is PSS, so the signature must verify under PSS
        let verifier =
            rsa::pss::VerifyingKey::<Sha256>::new(RsaPublicKey::from(&key));
        let sig = rsa::pss::Signature::try_from(sig_bytes.as_slice()).unwrap();
        let payload = canonical_payload("GET", "/portfolio/balance", 1700000000000);
        verifier.verify(payload.as_bytes(), &sig).unwrap();
    }

    #[test]
    fn test_sign_with_pkcs1_pem() {
        let key = test_key();
        let pem = key.to_pkcs1_pem(rsa::pkcs8::LineEnding::LF).unwrap();

        // Legacy container still signs; PSS is attempted first for it too
        let sig_b64 = sign_request("POST", "/portfolio/orders", 99, pem.as_str()).unwrap();
        assert!(!sig_b64.is_empty());
    }

    #[test]
    fn test_sign_with_bare_base64() {
        let key = test_key();
        let der = key.to_pkcs8_der().unwrap();
        // Simulate a key pasted without PEM armor, with stray whitespace
        let bare = BASE64
            .encode(der.as_bytes())
            .as_bytes()
            .chunks(64)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect::<Vec<_>>()
            .join("\n  ");

        let sig = sign_request("GET", "/markets", 5, &bare).unwrap();
        assert!(!sig.is_empty());
    }

    #[test]
    fn test_signatures_differ_across_timestamps() {
        let key = test_key();
        let pem = key.to_pkcs8_pem(rsa::pkcs8::LineEnding::LF).unwrap();

        let a = sign_request("GET", "/markets", 1, &pem).unwrap();
        let b = sign_request("GET", "/markets", 2, &pem).unwrap();
        assert_ne!(a, b);
    }
}
