//! HMAC-SHA256 payload signing.
//!
//! The signature is computed over the exact bytes sent on the wire, never a
//! re-serialization, so receivers verifying against the body they read will
//! always match.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::DeliveryError;

type HmacSha256 = Hmac<Sha256>;

/// Sign the serialized payload with the shared secret.
///
/// Returns the base64 HMAC-SHA256 digest, to be sent as
/// `X-Hub-Signature-256: sha256=<digest>`.
pub fn sign(body: &[u8], secret: &str) -> Result<String, DeliveryError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DeliveryError::Signing(e.to_string()))?;
    mac.update(body);
    let digest = mac.finalize().into_bytes();
    Ok(base64::engine::general_purpose::STANDARD.encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reference_hmac() {
        // RFC 4231 test case 2, base64-encoded.
        let signature = sign(b"what do ya want for nothing?", "Jefe").unwrap();
        assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn matches_reference_hmac_for_json_body() {
        let signature = sign(br#"{"event":"issue_updated"}"#, "s").unwrap();
        assert_eq!(signature, "PWHqzgbauLZsF4fH1Eyho4wlQVFyTNSx8iIbfed7y8M=");
    }

    #[test]
    fn signing_is_idempotent() {
        let body = br#"{"issue":{"key":"ABC-1"}}"#;
        assert_eq!(sign(body, "secret").unwrap(), sign(body, "secret").unwrap());
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let body = b"payload";
        assert_ne!(sign(body, "a").unwrap(), sign(body, "b").unwrap());
    }
}
