//! GitHub webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body and
//! sends the result as `X-Hub-Signature-256: sha256=<hex digest>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Verify a GitHub webhook signature.
///
/// # Arguments
///
/// * `payload` - The raw request body, exactly as received
/// * `signature` - The `X-Hub-Signature-256` header value, if any
/// * `secret` - The configured webhook secret, if any
///
/// # Returns
///
/// `true` when no secret is configured, or when the header matches the
/// expected `sha256=<hex>` value. `false` when a secret is configured and the
/// header is missing, empty, or does not match.
pub fn verify_github_signature(payload: &[u8], signature: Option<&str>, secret: Option<&str>) -> bool {
    let secret = match secret {
        Some(s) if is_signature_verification_enabled(s) => s,
        _ => return true,
    };

    let signature = match signature {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!(payload_length = payload.len(), "github_signature_missing");
            return false;
        }
    };

    let expected = sign(payload, secret);

    let valid = constant_time_compare(&expected, signature);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "github_signature_mismatch"
        );
    }

    valid
}

/// Compute the `X-Hub-Signature-256` header value for a payload.
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can accept any key length");
    mac.update(payload);

    format!("{}{}", SIGNATURE_PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
///
/// Differing lengths return early; the length of a valid signature is public.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check if a configured secret enables verification.
///
/// Only the empty string disables it; whitespace is a usable key.
pub fn is_signature_verification_enabled(secret: &str) -> bool {
    !secret.is_empty()
}
