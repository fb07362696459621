use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignedObjectParams {
    pub expires: i64,
    pub sig: String,
}

fn reject(status: StatusCode, kind: &str, message: &str) -> Response {
    (status, Json(json!({ "error": message, "kind": kind }))).into_response()
}

fn object_not_found() -> Response {
    reject(StatusCode::NOT_FOUND, "NotFound", "Object not found")
}

/// Stream an object through a signed URL
///
/// GET /objects/{bucket}/{path}?expires=<unix>&sig=<hex>
///
/// The signature covers bucket, path and expiry, so a URL cannot be
/// re-pointed at another object or extended.
pub async fn get_object(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    params: Result<Query<SignedObjectParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => return AppError::InvalidArgument(e.body_text()).into_response(),
    };
    let path = path.trim_start_matches('/');

    if !state
        .store
        .verify(&bucket, path, params.expires, &params.sig, Utc::now().timestamp())
    {
        tracing::warn!("Rejected signed object request for {}/{}", bucket, path);
        return reject(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "Invalid or expired signature",
        );
    }

    let full = match state.store.object_path(&bucket, path) {
        Ok(full) => full,
        Err(e) => return AppError::InvalidArgument(e.to_string()).into_response(),
    };

    let file = match tokio::fs::File::open(&full).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return object_not_found(),
        Err(e) => {
            tracing::error!("Failed to open object {}/{}: {}", bucket, path, e);
            return AppError::StorageUnavailable(e.to_string()).into_response();
        }
    };

    let meta = match file.metadata().await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return object_not_found(),
        Err(e) => {
            tracing::error!("Failed to stat object {}/{}: {}", bucket, path, e);
            return AppError::StorageUnavailable(e.to_string()).into_response();
        }
    };

    tracing::info!("Serving {}/{} ({} bytes)", bucket, path, meta.len());

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.len()));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, no-store"),
    );

    response
}
