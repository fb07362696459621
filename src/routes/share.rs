use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::constants::VIEWER_PATH;
use crate::error::{AppError, Result};
use crate::security::extract_bearer;
use crate::shares::{self, IssueParams};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateShareRequest {
    pub path: Option<String>,
    pub code: Option<String>,
    pub seconds: Option<i64>,
    pub bucket: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateShareResponse {
    pub id: String,
    #[serde(rename = "viewerUrl")]
    pub viewer_url: String,
}

#[derive(Debug, Deserialize)]
pub struct RedeemShareRequest {
    pub id: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RedeemShareResponse {
    pub url: String,
}

/// Origin for viewer links and signed URLs: configured base URL, else the
/// request's own host
fn request_origin(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return base.clone();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty());

    match host {
        Some(host) => {
            let proto = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("https");
            format!("{}://{}", proto, host)
        }
        None => state.config.bind_origin(),
    }
}

/// Issue a new share link
///
/// POST /api/shares with `Authorization: Bearer <token>` and
/// `{path, code, seconds?, bucket?}`. Only privileged callers may issue.
/// The code is hashed immediately and never persisted or logged.
pub async fn create_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<CreateShareRequest>, JsonRejection>,
) -> Result<Json<CreateShareResponse>> {
    let token = extract_bearer(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    )?
    .to_string();

    let identity = state.identity.clone();
    let caller =
        tokio::task::spawn_blocking(move || shares::authorize_issuer(identity.as_ref(), &token))
            .await??;

    let Json(payload) = payload.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    let params = IssueParams::new(
        payload.path,
        payload.code,
        payload.seconds,
        payload.bucket,
        &state.config.default_bucket,
    )?;

    let db = state.db.clone();
    let pepper = state.config.code_pepper.clone();
    let issued = tokio::task::spawn_blocking(move || {
        shares::issue_share(&db, &caller, params, &pepper, Utc::now().timestamp())
    })
    .await??;

    let viewer_url = format!(
        "{}{}?id={}",
        request_origin(&state, &headers),
        VIEWER_PATH,
        issued.id
    );

    Ok(Json(CreateShareResponse {
        id: issued.id,
        viewer_url,
    }))
}

/// Redeem a share link for a signed download URL
///
/// POST /api/shares/redeem with `{id, code}`. No authentication: possession
/// of the handle and the code is the credential.
pub async fn redeem_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<RedeemShareRequest>, JsonRejection>,
) -> Result<Json<RedeemShareResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    let id = payload.id.unwrap_or_default();
    let code = payload.code.unwrap_or_default();

    let db = state.db.clone();
    let objects = state.objects.clone();
    let origin = request_origin(&state, &headers);
    let pepper = state.config.code_pepper.clone();

    let url = tokio::task::spawn_blocking(move || {
        shares::redeem_share(
            &db,
            objects.as_ref(),
            &origin,
            &pepper,
            &id,
            &code,
            Utc::now().timestamp(),
        )
    })
    .await??;

    Ok(Json(RedeemShareResponse { url }))
}
