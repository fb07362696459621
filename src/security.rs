use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::constants::{CALLER_TOKEN_PREFIX, ERR_INVALID_TOKEN, ERR_MISSING_BEARER};
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Access Codes
// =============================================================================

/// Hash an access code together with the server-side pepper
///
/// `code_hash = SHA256(code + pepper)`, hex encoded. Short human-chosen codes
/// cannot be brute-forced from a leaked shares table without the pepper.
pub fn hash_access_code(code: &str, pepper: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hasher.update(pepper.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a supplied code against a stored digest without leaking timing
pub fn verify_access_code(code: &str, pepper: &str, stored_hash: &str) -> bool {
    constant_time_eq(&hash_access_code(code, pepper), stored_hash)
}

/// Compare two secrets in constant time (length mismatch returns false)
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

// =============================================================================
// Caller Tokens
// =============================================================================

/// Hash a bearer token with SHA-256 for storage/lookup
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Mint a new caller token: `vst_<32 hex chars>`
pub fn generate_caller_token() -> String {
    format!("{}{}", CALLER_TOKEN_PREFIX, Uuid::new_v4().as_simple())
}

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AppError> {
    let header = header.ok_or_else(|| AppError::Unauthenticated(ERR_MISSING_BEARER.to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthenticated(ERR_MISSING_BEARER.to_string()))?
        .trim();

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(AppError::Unauthenticated(ERR_INVALID_TOKEN.to_string()));
    }

    Ok(token)
}

// =============================================================================
// Signed Object URLs
// =============================================================================

fn object_mac(secret: &str, bucket: &str, path: &str, expires: i64) -> Option<HmacSha256> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return None;
        }
    };
    mac.update(bucket.as_bytes());
    mac.update(b"\n");
    mac.update(path.as_bytes());
    mac.update(b"\n");
    mac.update(expires.to_string().as_bytes());
    Some(mac)
}

/// Sign a bucket/path/expiry triple, returning the hex HMAC-SHA256
pub fn sign_object(secret: &str, bucket: &str, path: &str, expires: i64) -> Option<String> {
    object_mac(secret, bucket, path, expires).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Verify a signed object request
///
/// Checks the signature in constant time, then that `now < expires`.
pub fn verify_object_signature(
    secret: &str,
    bucket: &str,
    path: &str,
    expires: i64,
    signature: &str,
    now: i64,
) -> bool {
    let Some(mac) = object_mac(secret, bucket, path, expires) else {
        return false;
    };

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    if mac.verify_slice(&sig_bytes).is_err() {
        return false;
    }

    if now >= expires {
        tracing::debug!("Signed URL expired at {} (now {})", expires, now);
        return false;
    }

    true
}
