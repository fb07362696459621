/// Share lifetime used when the issuer does not supply one (1 hour)
pub const DEFAULT_SHARE_LIFETIME_SECS: i64 = 3600;

/// Longest lifetime a share may be issued with (30 days)
pub const MAX_SHARE_LIFETIME_SECS: i64 = 30 * 86_400;

/// Every share is single-use
pub const SHARE_MAX_USES: u32 = 1;

/// Validity window of the signed download URL returned by a redemption.
/// Kept far below the share lifetime so the URL itself is not worth passing on.
pub const SIGNED_URL_TTL_SECS: i64 = 60;

/// Bucket used when the issuer does not name one
pub const DEFAULT_BUCKET: &str = "vault-docs";

/// Page that consumes the redemption handle on the client side
pub const VIEWER_PATH: &str = "/viewer.html";

/// Prefix of minted caller bearer tokens
pub const CALLER_TOKEN_PREFIX: &str = "vst_";

/// Upper bound on object key length
pub const MAX_OBJECT_KEY_LEN: usize = 1024;

pub const BUCKET_NAME_MIN_LEN: usize = 3;
pub const BUCKET_NAME_MAX_LEN: usize = 63;

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_MISSING_BEARER: &str = "Missing bearer token";

pub const ERR_INVALID_TOKEN: &str = "Invalid token";

pub const ERR_PATH_AND_CODE_REQUIRED: &str = "path and code required";

pub const ERR_ID_AND_CODE_REQUIRED: &str = "id and code required";

pub const ERR_INVALID_LIFETIME: &str = "seconds must be a positive integer no larger than 30 days";
