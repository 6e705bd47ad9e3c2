//! Shopify webhook signature verification.
//!
//! Shopify signs each webhook with HMAC-SHA256 over the raw request body and
//! sends the base64 digest in the `X-Shopify-Hmac-Sha256` header.
//! Reference: https://shopify.dev/docs/apps/build/webhooks/subscribe/https#step-5-verify-the-webhook

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use crate::Config;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 signature.
pub const SHOPIFY_HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Verify a Shopify webhook signature.
///
/// # Arguments
///
/// * `body` - The raw, unmodified request body
/// * `signature` - The `X-Shopify-Hmac-Sha256` header value
/// * `secret` - The webhook signing secret
///
/// # Returns
///
/// `true` only if the header equals the base64 HMAC of the body. Empty or
/// malformed inputs are reported as `false`, never as an error.
pub fn verify_shopify_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    if secret.is_empty() || signature.trim().is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature.trim().is_empty(),
            "shopify_signature_missing_fields"
        );
        return false;
    }

    let expected = match compute_signature(body, secret) {
        Some(sig) => sig,
        None => {
            warn!("shopify_signature_invalid_key");
            return false;
        }
    };

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected, signature.trim());

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "shopify_signature_mismatch"
        );
    }

    valid
}

/// Base64 HMAC-SHA256 of `body` keyed with `secret`.
pub fn compute_signature(body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison. Lengths are not secret.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// How inbound webhooks are authenticated, chosen once at startup.
#[derive(Debug, Clone)]
pub enum SignatureVerifier {
    /// Check every request against the shared secret. A missing secret
    /// rejects everything.
    Strict { secret: Option<String> },

    /// Accept every request. Only selected outside production.
    PassThrough,
}

impl SignatureVerifier {
    /// Select the strategy for the configured deployment environment.
    pub fn from_config(config: &Config) -> Self {
        if config.is_production() {
            if config.shopify_webhook_secret.is_none() {
                error!("shopify_secret_not_configured_all_webhooks_will_be_rejected");
            }
            SignatureVerifier::Strict {
                secret: config.shopify_webhook_secret.clone(),
            }
        } else {
            warn!(
                deploy_env = %config.deploy_env,
                "shopify_signature_verification_bypassed"
            );
            SignatureVerifier::PassThrough
        }
    }

    /// Strategy name, for logs.
    pub fn mode(&self) -> &'static str {
        match self {
            SignatureVerifier::Strict { .. } => "strict",
            SignatureVerifier::PassThrough => "pass_through",
        }
    }

    /// Check a request body against its (optional) signature header.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> bool {
        match self {
            SignatureVerifier::Strict { secret } => {
                let Some(secret) = secret.as_deref() else {
                    warn!("shopify_signature_rejected_no_secret");
                    return false;
                };
                verify_shopify_signature(body, signature.unwrap_or(""), secret)
            }
            SignatureVerifier::PassThrough => {
                warn!(
                    has_signature = signature.is_some(),
                    "shopify_signature_check_skipped"
                );
                true
            }
        }
    }
}
