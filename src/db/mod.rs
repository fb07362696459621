pub mod tables;

use redb::{Database, Error as RedbError};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

pub const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;
    init_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create tables if they don't exist by opening them
#[allow(clippy::result_large_err)]
pub fn init_tables(db: &Database) -> std::result::Result<(), RedbError> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::SHARES)?;
        let _ = write_txn.open_table(tables::CALLER_TOKENS)?;
        let _ = write_txn.open_table(tables::PROFILES)?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Serialize a record for storage
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(record, BINCODE_CONFIG)?)
}

/// Deserialize a stored record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (record, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(record)
}
