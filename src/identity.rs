//! Caller identity resolution.
//!
//! Bearer tokens are never stored in plaintext: the `caller_tokens` table is
//! keyed by the token's SHA-256 digest. The privileged flag lives in a
//! separate `profiles` table keyed by caller id.

use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};

use crate::db::{self, tables, Db};
use crate::error::Result;
use crate::models::{Caller, CallerRecord, ProfileRecord};
use crate::security::{generate_caller_token, hash_token};

/// Resolves bearer tokens to callers and callers to their privilege flag
///
/// Implementations are blocking and are called from `spawn_blocking`.
pub trait IdentityVerifier: Send + Sync {
    /// `Ok(None)` when the token is unknown
    fn resolve_caller(&self, token: &str) -> Result<Option<Caller>>;

    /// Callers without a profile are not privileged
    fn is_privileged(&self, caller: &Caller) -> Result<bool>;
}

/// Identity verifier backed by the service's own redb tables
#[derive(Clone)]
pub struct DbIdentityVerifier {
    db: Db,
}

impl DbIdentityVerifier {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl IdentityVerifier for DbIdentityVerifier {
    fn resolve_caller(&self, token: &str) -> Result<Option<Caller>> {
        let read_txn = self.db.begin_read()?;
        let tokens = read_txn.open_table(tables::CALLER_TOKENS)?;

        let record: Option<CallerRecord> = tokens
            .get(hash_token(token).as_str())?
            .map(|b| db::decode(b.value()))
            .transpose()?;

        Ok(record.map(|r| Caller { id: r.caller_id }))
    }

    fn is_privileged(&self, caller: &Caller) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let profiles = read_txn.open_table(tables::PROFILES)?;

        let profile: Option<ProfileRecord> = profiles
            .get(caller.id.as_str())?
            .map(|b| db::decode(b.value()))
            .transpose()?;

        Ok(profile.is_some_and(|p| p.is_admin))
    }
}

/// Create or update a caller profile and mint a fresh bearer token for it
///
/// Returns the plaintext token; only its digest is persisted.
pub fn provision_caller(db: &Db, caller_id: &str, is_admin: bool) -> Result<String> {
    let token = generate_caller_token();
    let now = Utc::now().timestamp();

    let write_txn = db.begin_write()?;
    {
        let mut profiles = write_txn.open_table(tables::PROFILES)?;
        let created_at = profiles
            .get(caller_id)?
            .map(|b| db::decode::<ProfileRecord>(b.value()))
            .transpose()?
            .map(|p| p.created_at)
            .unwrap_or(now);

        let profile = ProfileRecord {
            is_admin,
            created_at,
        };
        profiles.insert(caller_id, db::encode(&profile)?.as_slice())?;
        drop(profiles);

        let mut tokens = write_txn.open_table(tables::CALLER_TOKENS)?;
        let record = CallerRecord {
            caller_id: caller_id.to_string(),
            created_at: now,
        };
        tokens.insert(hash_token(&token).as_str(), db::encode(&record)?.as_slice())?;
    }
    write_txn.commit()?;

    tracing::info!("Provisioned caller {} (admin: {})", caller_id, is_admin);

    Ok(token)
}
