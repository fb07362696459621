//! Share issuance and redemption.
//!
//! A share is a single-use, time-boxed, code-protected grant to one stored
//! object. State transitions are evaluated lazily at redemption time:
//!
//! ```text
//! [Created] --(redeem success)--> [Consumed]
//! [Created] --(now >= expires_at)--> [Expired]
//! ```
//!
//! The use counter is only ever moved inside a redb write transaction that
//! re-reads the record and re-checks liveness. redb runs write transactions
//! one at a time, so concurrent redemptions of the same share cannot both
//! observe `uses < max_uses`.

use redb::{ReadableDatabase, ReadableTable};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_SHARE_LIFETIME_SECS, ERR_ID_AND_CODE_REQUIRED, ERR_INVALID_LIFETIME, ERR_INVALID_TOKEN,
    ERR_PATH_AND_CODE_REQUIRED, MAX_SHARE_LIFETIME_SECS, SIGNED_URL_TTL_SECS,
};
use crate::db::{self, tables, Db};
use crate::error::{AppError, Result};
use crate::identity::IdentityVerifier;
use crate::models::{Caller, ShareRecord};
use crate::objects::ObjectStore;
use crate::security::{hash_access_code, verify_access_code};

/// Validated issuance arguments
#[derive(Debug, Clone)]
pub struct IssueParams {
    pub bucket: String,
    pub path: String,
    pub code: String,
    pub lifetime_secs: i64,
}

impl IssueParams {
    /// Apply defaults and validate raw request fields
    pub fn new(
        path: Option<String>,
        code: Option<String>,
        seconds: Option<i64>,
        bucket: Option<String>,
        default_bucket: &str,
    ) -> Result<Self> {
        let path = path.unwrap_or_default();
        let code = code.unwrap_or_default();
        if path.trim().is_empty() || code.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                ERR_PATH_AND_CODE_REQUIRED.to_string(),
            ));
        }

        if !ShareRecord::validate_path(&path) {
            return Err(AppError::InvalidArgument("Invalid object path".to_string()));
        }

        let lifetime_secs = seconds.unwrap_or(DEFAULT_SHARE_LIFETIME_SECS);
        if lifetime_secs <= 0 || lifetime_secs > MAX_SHARE_LIFETIME_SECS {
            return Err(AppError::InvalidArgument(ERR_INVALID_LIFETIME.to_string()));
        }

        let bucket = match bucket {
            Some(b) if !b.is_empty() => b,
            _ => default_bucket.to_string(),
        };
        if !ShareRecord::validate_bucket(&bucket) {
            return Err(AppError::InvalidArgument("Invalid bucket name".to_string()));
        }

        Ok(Self {
            bucket,
            path,
            code,
            lifetime_secs,
        })
    }
}

/// Result of a successful issuance
#[derive(Debug, Clone)]
pub struct IssuedShare {
    pub id: String,
    pub record: ShareRecord,
}

/// Resolve the bearer token to a caller allowed to issue shares
pub fn authorize_issuer(verifier: &dyn IdentityVerifier, token: &str) -> Result<Caller> {
    let caller = verifier
        .resolve_caller(token)?
        .ok_or_else(|| AppError::Unauthenticated(ERR_INVALID_TOKEN.to_string()))?;

    if !verifier.is_privileged(&caller)? {
        tracing::warn!("Share issuance refused for unprivileged caller {}", caller.id);
        return Err(AppError::Forbidden);
    }

    Ok(caller)
}

/// Persist a new single-use share for `caller`
///
/// The plaintext code is consumed here and only its digest is stored.
pub fn issue_share(
    db: &Db,
    caller: &Caller,
    params: IssueParams,
    pepper: &str,
    now: i64,
) -> Result<IssuedShare> {
    let IssueParams {
        bucket,
        path,
        code,
        lifetime_secs,
    } = params;

    let code_hash = hash_access_code(&code, pepper);
    drop(code);

    let id = Uuid::new_v4().to_string();
    let record = ShareRecord::new(
        bucket,
        path,
        code_hash,
        caller.id.clone(),
        now,
        lifetime_secs,
    );

    let write_txn = db.begin_write()?;
    {
        let mut shares = write_txn.open_table(tables::SHARES)?;
        shares.insert(id.as_str(), db::encode(&record)?.as_slice())?;
    }
    write_txn.commit()?;

    tracing::info!(
        "Share {} issued by {} for {}/{} (expires at {})",
        id,
        caller.id,
        record.bucket,
        record.path,
        record.expires_at
    );

    Ok(IssuedShare { id, record })
}

/// Point lookup of a share record
pub fn fetch_share(db: &Db, id: &str) -> Result<Option<ShareRecord>> {
    let read_txn = db.begin_read()?;
    let shares = read_txn.open_table(tables::SHARES)?;

    let record = shares
        .get(id)?
        .map(|b| db::decode(b.value()))
        .transpose()?;

    Ok(record)
}

/// Increment `uses` only if the share is still live, in one write transaction
///
/// Fails with `Expired` or `AlreadyUsed` (re-checked against the stored state)
/// when another redemption got there first or the share lapsed meanwhile.
pub fn consume_use(db: &Db, id: &str, now: i64) -> Result<ShareRecord> {
    let write_txn = db.begin_write()?;
    let record = {
        let mut shares = write_txn.open_table(tables::SHARES)?;
        let mut record: ShareRecord = shares
            .get(id)?
            .map(|b| db::decode(b.value()))
            .transpose()?
            .ok_or(AppError::NotFound)?;

        record.consume(now)?;
        shares.insert(id, db::encode(&record)?.as_slice())?;
        record
    };
    write_txn.commit()?;

    Ok(record)
}

/// Validate a redemption attempt and return a short-lived signed URL
///
/// Check order: existence, expiry, use count, code. A failed code check or a
/// failed signing does not consume the use. The URL is rooted at `origin`.
pub fn redeem_share(
    db: &Db,
    objects: &dyn ObjectStore,
    origin: &str,
    pepper: &str,
    id: &str,
    code: &str,
    now: i64,
) -> Result<String> {
    if id.trim().is_empty() || code.is_empty() {
        return Err(AppError::InvalidArgument(
            ERR_ID_AND_CODE_REQUIRED.to_string(),
        ));
    }

    let record = fetch_share(db, id)?.ok_or(AppError::NotFound)?;

    if let Err(e) = record.ensure_live(now) {
        tracing::info!("Redemption of share {} refused: {}", id, e);
        return Err(e);
    }

    if !verify_access_code(code, pepper, &record.code_hash) {
        tracing::warn!("Invalid code presented for share {}", id);
        return Err(AppError::InvalidCode);
    }

    let url = objects.signed_url(
        origin,
        &record.bucket,
        &record.path,
        SIGNED_URL_TTL_SECS,
        now,
    )?;

    if let Err(e) = consume_use(db, id, now) {
        tracing::warn!("Share {} lost a concurrent redemption: {}", id, e);
        return Err(e);
    }

    tracing::info!("Share {} redeemed", id);

    Ok(url)
}
