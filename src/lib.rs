//! VAULT share server library
//!
//! Issues single-use, code-protected, time-boxed share links for stored
//! documents and redeems them for short-lived signed download URLs.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod objects;
pub mod routes;
pub mod security;
pub mod shares;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use identity::{DbIdentityVerifier, IdentityVerifier};
use objects::{LocalObjectStore, ObjectStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub identity: Arc<dyn IdentityVerifier>,
    /// Signer used by redemption
    pub objects: Arc<dyn ObjectStore>,
    /// Same local store, for serving the URLs it signed
    pub store: Arc<LocalObjectStore>,
}

impl AppState {
    /// Create a new AppState with the default database-backed identity
    /// verifier and the local object store
    pub fn new(db: Db, config: Config) -> Self {
        let identity: Arc<dyn IdentityVerifier> = Arc::new(DbIdentityVerifier::new(db.clone()));
        let store = Arc::new(LocalObjectStore::from_config(&config));
        let objects: Arc<dyn ObjectStore> = store.clone();
        Self {
            db,
            config,
            identity,
            objects,
            store,
        }
    }
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    use routes::{
        admin_stats, create_share, get_object, health_check, provision_caller, redeem_share,
    };

    // Browsers call the share API cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let share_api = Router::new()
        .route("/api/shares", post(create_share))
        .route("/api/shares/redeem", post(redeem_share))
        .layer(cors);

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/objects/:bucket/*path", get(get_object))
        .route("/admin/stats", get(admin_stats))
        .route("/admin/callers", post(provision_caller))
        .merge(share_api);

    let router = if state.config.log_requests {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}
