//! Object store seam: signed, time-limited download URLs.
//!
//! `LocalObjectStore` keeps payloads under `{root}/{bucket}/{path}`, signs
//! URLs rooted at the requesting client's origin and checks those signatures
//! when the `/objects` route serves them back.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::Config;
use crate::error::AppError;
use crate::models::ShareRecord;
use crate::security::{sign_object, verify_object_signature};

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("object `{path}` not found in bucket `{bucket}`")]
    ObjectNotFound { bucket: String, path: String },
    #[error("invalid object key")]
    InvalidKey,
    #[error("signing key rejected")]
    Key,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<SigningError> for AppError {
    fn from(err: SigningError) -> Self {
        AppError::SigningFailed(err.to_string())
    }
}

/// Produces signed download URLs for stored objects
///
/// Implementations are blocking and are called from `spawn_blocking`.
pub trait ObjectStore: Send + Sync {
    /// Fails when the object does not exist
    ///
    /// `origin` is the scheme and authority the redeeming client reached this
    /// server on; stores that hand out their own hosts may ignore it.
    fn signed_url(
        &self,
        origin: &str,
        bucket: &str,
        path: &str,
        ttl_secs: i64,
        now: i64,
    ) -> Result<String, SigningError>;
}

/// Filesystem-backed object store
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    secret: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, secret: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            secret: secret.into(),
        }
    }

    /// Physical location of an object, after key validation
    pub fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, SigningError> {
        if !ShareRecord::validate_bucket(bucket) || !ShareRecord::validate_path(path) {
            return Err(SigningError::InvalidKey);
        }
        let mut full = self.root.clone();
        full.push(bucket);
        full.push(path);
        Ok(full)
    }

    /// Check a signature previously produced by `signed_url`
    pub fn verify(&self, bucket: &str, path: &str, expires: i64, sig: &str, now: i64) -> bool {
        verify_object_signature(&self.secret, bucket, path, expires, sig, now)
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.storage_dir, &config.url_signing_secret)
    }
}

impl ObjectStore for LocalObjectStore {
    fn signed_url(
        &self,
        origin: &str,
        bucket: &str,
        path: &str,
        ttl_secs: i64,
        now: i64,
    ) -> Result<String, SigningError> {
        let full = self.object_path(bucket, path)?;

        match std::fs::metadata(&full) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(SigningError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SigningError::ObjectNotFound {
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        }

        let expires = now + ttl_secs;
        let sig = sign_object(&self.secret, bucket, path, expires).ok_or(SigningError::Key)?;

        let encoded_path = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        Ok(format!(
            "{}/objects/{}/{}?expires={}&sig={}",
            origin.trim_end_matches('/'),
            bucket,
            encoded_path,
            expires,
            sig
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ORIGIN: &str = "https://vault.example/";

    fn store(temp_dir: &TempDir) -> LocalObjectStore {
        LocalObjectStore::new(temp_dir.path(), "secret")
    }

    fn put(temp_dir: &TempDir, bucket: &str, path: &str) {
        let full = temp_dir.path().join(bucket).join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, b"payload").unwrap();
    }

    #[test]
    fn test_signed_url_for_existing_object() {
        let temp_dir = TempDir::new().unwrap();
        put(&temp_dir, "vault-docs", "q1/annual report.pdf");

        let url = store(&temp_dir)
            .signed_url(ORIGIN, "vault-docs", "q1/annual report.pdf", 60, 1_000)
            .unwrap();

        assert!(url
            .starts_with("https://vault.example/objects/vault-docs/q1/annual%20report.pdf?"));
        assert!(url.contains("expires=1060"));

        let sig = url.split("sig=").nth(1).unwrap();
        let store = store(&temp_dir);
        assert!(store.verify("vault-docs", "q1/annual report.pdf", 1_060, sig, 1_000));
        assert!(!store.verify("vault-docs", "q1/annual report.pdf", 1_060, sig, 1_060));
        assert!(!store.verify("vault-docs", "q1/other.pdf", 1_060, sig, 1_000));
    }

    #[test]
    fn test_signed_url_follows_request_origin() {
        let temp_dir = TempDir::new().unwrap();
        put(&temp_dir, "vault-docs", "report.pdf");
        let store = store(&temp_dir);

        let public = store
            .signed_url("https://files.example.com", "vault-docs", "report.pdf", 60, 1_000)
            .unwrap();
        let internal = store
            .signed_url("http://10.0.0.5:8080", "vault-docs", "report.pdf", 60, 1_000)
            .unwrap();

        assert!(public.starts_with("https://files.example.com/objects/vault-docs/report.pdf?"));
        assert!(internal.starts_with("http://10.0.0.5:8080/objects/vault-docs/report.pdf?"));
    }

    #[test]
    fn test_missing_object_fails() {
        let temp_dir = TempDir::new().unwrap();

        let result = store(&temp_dir).signed_url(ORIGIN, "vault-docs", "missing.pdf", 60, 1_000);
        assert!(matches!(result, Err(SigningError::ObjectNotFound { .. })));
    }

    #[test]
    fn test_directory_is_not_an_object() {
        let temp_dir = TempDir::new().unwrap();
        put(&temp_dir, "vault-docs", "dir/file.txt");

        let result = store(&temp_dir).signed_url(ORIGIN, "vault-docs", "dir", 60, 1_000);
        assert!(matches!(result, Err(SigningError::ObjectNotFound { .. })));
    }

    #[test]
    fn test_unsafe_keys_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(matches!(
            store.signed_url(ORIGIN, "vault-docs", "../escape", 60, 1_000),
            Err(SigningError::InvalidKey)
        ));
        assert!(matches!(
            store.signed_url(ORIGIN, "../x", "file", 60, 1_000),
            Err(SigningError::InvalidKey)
        ));
    }
}
