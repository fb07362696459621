use serde::{Deserialize, Serialize};

use crate::constants::{
    BUCKET_NAME_MAX_LEN, BUCKET_NAME_MIN_LEN, MAX_OBJECT_KEY_LEN, SHARE_MAX_USES,
};
use crate::error::{AppError, Result};

/// Share record stored in redb, keyed by share id
///
/// Only the digest of the access code is kept. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub bucket: String,
    pub path: String,
    /// Hex SHA-256 of the peppered access code
    pub code_hash: String,
    pub expires_at: i64,
    pub max_uses: u32,
    pub uses: u32,
    /// Caller id of the issuer
    pub created_by: String,
    pub created_at: i64,
}

/// Lifecycle state of a share, derived lazily from the record and the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareState {
    Created,
    Consumed,
    Expired,
}

impl ShareRecord {
    /// Build a fresh single-use record
    pub fn new(
        bucket: String,
        path: String,
        code_hash: String,
        created_by: String,
        now: i64,
        lifetime_secs: i64,
    ) -> Self {
        Self {
            bucket,
            path,
            code_hash,
            expires_at: now + lifetime_secs,
            max_uses: SHARE_MAX_USES,
            uses: 0,
            created_by,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    pub fn is_used_up(&self) -> bool {
        self.uses >= self.max_uses
    }

    /// Expiry wins over consumption when both apply
    pub fn state(&self, now: i64) -> ShareState {
        if self.is_expired(now) {
            ShareState::Expired
        } else if self.is_used_up() {
            ShareState::Consumed
        } else {
            ShareState::Created
        }
    }

    /// Liveness checks that precede the code check
    pub fn ensure_live(&self, now: i64) -> Result<()> {
        match self.state(now) {
            ShareState::Created => Ok(()),
            ShareState::Expired => Err(AppError::Expired),
            ShareState::Consumed => Err(AppError::AlreadyUsed),
        }
    }

    /// Consume one use, re-checking liveness against the current stored state
    pub fn consume(&mut self, now: i64) -> Result<()> {
        self.ensure_live(now)?;
        self.uses += 1;
        Ok(())
    }

    /// Object key rules
    ///
    /// Every `/`-separated segment must be non-empty and neither `.` nor `..`:
    /// URL clients collapse such segments, which would break the signature
    /// over the raw key. Backslashes and control bytes are rejected too.
    pub fn validate_path(path: &str) -> bool {
        !path.is_empty()
            && path.len() <= MAX_OBJECT_KEY_LEN
            && path
                .split('/')
                .all(|segment| !matches!(segment, "" | "." | ".."))
            && !path.bytes().any(|b| b.is_ascii_control() || b == b'\\')
    }

    /// S3-like bucket naming
    pub fn validate_bucket(name: &str) -> bool {
        (BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&name.len())
            && name
                .chars()
                .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
            && !name.starts_with(['.', '-'])
            && !name.ends_with(['.', '-'])
            && !name.contains("..")
    }
}
