use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Share not found")]
    NotFound,

    #[error("Share expired")]
    Expired,

    #[error("Share already used")]
    AlreadyUsed,

    #[error("Invalid code")]
    InvalidCode,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

impl AppError {
    /// Taxonomy name reported to clients alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::Forbidden => "Forbidden",
            AppError::InvalidArgument(_) => "InvalidArgument",
            AppError::NotFound => "NotFound",
            AppError::Expired => "Expired",
            AppError::AlreadyUsed => "AlreadyUsed",
            AppError::InvalidCode => "InvalidCode",
            AppError::SigningFailed(_) => "SigningFailed",
            AppError::StorageUnavailable(_)
            | AppError::Database(_)
            | AppError::Transaction(_)
            | AppError::Table(_)
            | AppError::Storage(_)
            | AppError::Commit(_)
            | AppError::Serialization(_)
            | AppError::Deserialization(_)
            | AppError::TaskJoin(_) => "StorageUnavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) | AppError::InvalidCode => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Expired | AppError::AlreadyUsed => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        // Infrastructure details stay in the logs
        let error_message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::Transaction(ref e) => {
                tracing::error!("Transaction error: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::Table(ref e) => {
                tracing::error!("Table error: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::Commit(ref e) => {
                tracing::error!("Commit error: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::Deserialization(ref e) => {
                tracing::error!("Malformed persisted record: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                "Storage unavailable".to_string()
            }
            AppError::StorageUnavailable(ref msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                "Storage unavailable".to_string()
            }
            AppError::SigningFailed(ref msg) => {
                tracing::error!("Signing failed: {}", msg);
                "Could not sign download URL".to_string()
            }
            AppError::Unauthenticated(msg) => msg,
            AppError::Forbidden => "Admin only".to_string(),
            AppError::InvalidArgument(msg) => msg,
            AppError::NotFound => "Share not found".to_string(),
            AppError::Expired => "Expired".to_string(),
            AppError::AlreadyUsed => "Already used".to_string(),
            AppError::InvalidCode => "Invalid code".to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gone_errors_share_status_but_not_kind() {
        assert_eq!(AppError::Expired.status(), StatusCode::GONE);
        assert_eq!(AppError::AlreadyUsed.status(), StatusCode::GONE);
        assert_ne!(AppError::Expired.kind(), AppError::AlreadyUsed.kind());
    }

    #[test]
    fn test_infrastructure_errors_fail_closed() {
        let err = AppError::StorageUnavailable("disk gone".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "StorageUnavailable");

        let err = AppError::SigningFailed("object missing".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "SigningFailed");
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(
            AppError::Unauthenticated("x".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::InvalidCode.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InvalidArgument("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
    }
}
