use serde::{Deserialize, Serialize};

/// Bearer token record stored in redb, keyed by the token's SHA-256 digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerRecord {
    pub caller_id: String,
    /// When the token was minted (Unix timestamp)
    pub created_at: i64,
}

/// Profile record stored in redb, keyed by caller id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Privileged callers may issue shares
    pub is_admin: bool,
    pub created_at: i64,
}

/// Authenticated caller resolved from a bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
}

impl Caller {
    /// Caller ids are short printable identifiers
    pub fn validate_id(id: &str) -> bool {
        (1..=128).contains(&id.len())
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
    }
}
