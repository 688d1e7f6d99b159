use crate::error::WebhookError;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

const SIGNATURE_256: &str = "x-hub-signature-256";
const SIGNATURE_SHA1: &str = "x-hub-signature";

/// Verify the webhook signature carried in `headers` against `payload`.
///
/// `X-Hub-Signature-256` wins over the legacy `X-Hub-Signature` when both
/// are present.
pub fn verify_headers(secret: &[u8], headers: &HeaderMap, payload: &[u8]) -> Result<(), WebhookError> {
    let signature = headers
        .get(SIGNATURE_256)
        .or_else(|| headers.get(SIGNATURE_SHA1))
        .ok_or(WebhookError::MissingHeader("X-Hub-Signature-256"))?;
    let signature = signature
        .to_str()
        .map_err(|_| WebhookError::SignatureFormat("non-ASCII header value".to_string()))?;
    verify_signature(secret, payload, signature)
}

/// Constant-time check of a `sha256=<hex>` or `sha1=<hex>` signature
pub fn verify_signature(secret: &[u8], payload: &[u8], signature: &str) -> Result<(), WebhookError> {
    let (algorithm, digest) = signature
        .split_once('=')
        .ok_or_else(|| WebhookError::SignatureFormat(signature.to_string()))?;
    let expected = hex::decode(digest)
        .map_err(|_| WebhookError::SignatureFormat(format!("{}=<invalid hex>", algorithm)))?;

    let verified = match algorithm {
        "sha256" => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret)
                .map_err(|_| WebhookError::InvalidSignature)?;
            mac.update(payload);
            mac.verify_slice(&expected)
        }
        "sha1" => {
            let mut mac = Hmac::<Sha1>::new_from_slice(secret)
                .map_err(|_| WebhookError::InvalidSignature)?;
            mac.update(payload);
            mac.verify_slice(&expected)
        }
        other => return Err(WebhookError::SignatureFormat(other.to_string())),
    };
    verified.map_err(|_| WebhookError::InvalidSignature)
}

#[cfg(test)]
pub(crate) fn sign_sha256(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
