use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};
use std::fs;
use uuid::Uuid;

use crate::models::{Caller, ShareRecord};
use crate::security::constant_time_eq;
use crate::{db, db::tables, identity, AppError, AppState, Config, Result};

/// Query parameters for admin endpoints
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    /// Admin secret key for authentication
    pub key: String,
}

/// Database statistics response
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub caller_count: u64,
    pub share_count: u64,
    pub live_share_count: u64,
    pub database_size_bytes: u64,
    pub database_size_human: String,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionCallerRequest {
    #[serde(rename = "callerId")]
    pub caller_id: Option<String>,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct ProvisionCallerResponse {
    #[serde(rename = "callerId")]
    pub caller_id: String,
    /// Shown once; only its digest is stored
    pub token: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Format bytes into human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Admin routes are disabled unless ADMIN_SECRET_KEY is configured
fn require_admin_key(
    config: &Config,
    params: std::result::Result<Query<AdminQuery>, QueryRejection>,
) -> Result<()> {
    let admin_key = config
        .admin_secret_key
        .as_ref()
        .ok_or_else(|| AppError::Unauthenticated("Admin endpoints disabled".to_string()))?;

    let Query(params) = params.map_err(|e| {
        tracing::debug!("Admin request without usable key: {}", e.body_text());
        AppError::Unauthenticated("Missing admin key".to_string())
    })?;

    if !constant_time_eq(&params.key, admin_key) {
        tracing::warn!("Invalid admin key attempt");
        return Err(AppError::Unauthenticated("Invalid admin key".to_string()));
    }

    Ok(())
}

/// Admin stats endpoint
///
/// GET /admin/stats?key=<admin_secret_key>
pub async fn admin_stats(
    State(state): State<AppState>,
    params: std::result::Result<Query<AdminQuery>, QueryRejection>,
) -> Result<Json<AdminStatsResponse>> {
    require_admin_key(&state.config, params)?;

    let database_size_bytes = fs::metadata(&state.config.database_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let db = state.db.clone();
    let (caller_count, share_count, live_share_count) =
        tokio::task::spawn_blocking(move || -> Result<(u64, u64, u64)> {
            let now = Utc::now().timestamp();
            let read_txn = db.begin_read()?;

            let caller_count = read_txn.open_table(tables::PROFILES)?.len()?;

            let shares = read_txn.open_table(tables::SHARES)?;
            let share_count = shares.len()?;
            let mut live_share_count = 0;
            for entry in shares.iter()? {
                let (_, value) = entry?;
                let record: ShareRecord = db::decode(value.value())?;
                if record.ensure_live(now).is_ok() {
                    live_share_count += 1;
                }
            }

            Ok((caller_count, share_count, live_share_count))
        })
        .await??;

    tracing::info!(
        "Admin stats requested: {} callers, {} shares ({} live), {} database",
        caller_count,
        share_count,
        live_share_count,
        format_bytes(database_size_bytes)
    );

    Ok(Json(AdminStatsResponse {
        caller_count,
        share_count,
        live_share_count,
        database_size_bytes,
        database_size_human: format_bytes(database_size_bytes),
    }))
}

/// Provision a caller and mint a bearer token for it
///
/// POST /admin/callers?key=<admin_secret_key> with `{callerId?, isAdmin}`.
/// Re-provisioning an existing caller updates its privilege flag and adds
/// another token.
pub async fn provision_caller(
    State(state): State<AppState>,
    params: std::result::Result<Query<AdminQuery>, QueryRejection>,
    payload: std::result::Result<Json<ProvisionCallerRequest>, JsonRejection>,
) -> Result<Json<ProvisionCallerResponse>> {
    require_admin_key(&state.config, params)?;

    let Json(payload) = payload.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    let caller_id = payload
        .caller_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if !Caller::validate_id(&caller_id) {
        return Err(AppError::InvalidArgument("Invalid caller id".to_string()));
    }

    let db = state.db.clone();
    let is_admin = payload.is_admin;
    let id = caller_id.clone();
    let token =
        tokio::task::spawn_blocking(move || identity::provision_caller(&db, &id, is_admin))
            .await??;

    Ok(Json(ProvisionCallerResponse {
        caller_id,
        token,
        is_admin,
    }))
}
