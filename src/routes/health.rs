use axum::{extract::State, Json};
use redb::ReadableDatabase;
use serde_json::{json, Value};

use crate::db::tables;
use crate::AppState;

/// Health check endpoint
///
/// Reports whether the share table is readable and the object store root
/// exists. Either failing marks the service unhealthy.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db = state.db.clone();
    let database = tokio::task::spawn_blocking(move || {
        match db
            .begin_read()
            .map_err(redb::Error::from)
            .and_then(|txn| txn.open_table(tables::SHARES).map_err(redb::Error::from))
        {
            Ok(_) => "connected",
            Err(e) => {
                tracing::error!("Share table unreadable: {:?}", e);
                "disconnected"
            }
        }
    })
    .await
    .unwrap_or("error");

    let storage = match tokio::fs::metadata(&state.config.storage_dir).await {
        Ok(meta) if meta.is_dir() => "available",
        Ok(_) => "unavailable",
        Err(e) => {
            tracing::error!("Object store root {} unusable: {}", state.config.storage_dir, e);
            "unavailable"
        }
    };

    let healthy = database == "connected" && storage == "available";

    Json(json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "database": database,
        "storage": storage,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
