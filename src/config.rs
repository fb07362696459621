use std::env;

use crate::constants::DEFAULT_BUCKET;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub storage_dir: String,
    pub default_bucket: String,
    /// Origin used in viewer and signed URLs; derived from request headers when unset
    pub public_base_url: Option<String>,
    pub environment: String,
    pub url_signing_secret: String,
    pub code_pepper: String,
    /// Admin routes are disabled when unset
    pub admin_secret_key: Option<String>,
    pub log_requests: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/vault-share.db".to_string());

        let storage_dir = env::var("STORAGE_DIR").unwrap_or_else(|_| "./data/objects".to_string());

        let default_bucket =
            env::var("DEFAULT_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string());

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let url_signing_secret = env::var("URL_SIGNING_SECRET")
            .map_err(|_| "URL_SIGNING_SECRET must be set for signed download URLs")?;

        let code_pepper = env::var("CODE_PEPPER")
            .map_err(|_| "CODE_PEPPER must be set for access code hashing")?;

        let admin_secret_key = env::var("ADMIN_SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        let log_requests = env::var("LOG_REQUESTS")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Config {
            server_host,
            server_port,
            database_path,
            storage_dir,
            default_bucket,
            public_base_url,
            environment,
            url_signing_secret,
            code_pepper,
            admin_secret_key,
            log_requests,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Origin of the bind address, for requests that carry no Host header
    pub fn bind_origin(&self) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.server_address()))
    }
}
