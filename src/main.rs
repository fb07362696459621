use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_share_server::{app, open_database, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vault_share_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting VAULT share server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}, Default bucket: {}",
        config.environment,
        config.server_address(),
        config.default_bucket
    );
    if config.admin_secret_key.is_none() {
        tracing::warn!("ADMIN_SECRET_KEY not set; admin endpoints are disabled");
    }

    // Open database (blocking file I/O)
    let db_path = config.database_path.clone();
    let db = tokio::task::spawn_blocking(move || open_database(db_path)).await??;

    std::fs::create_dir_all(&config.storage_dir)?;

    let addr: SocketAddr = config.server_address().parse()?;
    let router = app(AppState::new(db, config));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
