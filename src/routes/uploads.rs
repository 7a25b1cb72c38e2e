// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image uploads and share images.

use crate::error::{AppError, Result};
use crate::routes::query_or_400;
use crate::services::presign::{presigned_put_url, upload_key};
use crate::AppState;
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/presigned", get(presigned))
        .route("/spotlight", get(spotlight))
}

#[derive(Deserialize)]
struct PresignedQuery {
    filename: String,
    content_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PresignedResponse {
    /// PUT the file here
    pub url: String,
    pub key: String,
}

/// Presigned S3 URL for uploading an image.
async fn presigned(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<PresignedQuery>, QueryRejection>,
) -> Result<Json<PresignedResponse>> {
    let query = query_or_400(query)?;
    if !query.content_type.starts_with("image/") {
        return Err(AppError::BadRequest(format!(
            "unsupported content type {}",
            query.content_type
        )));
    }

    let key = upload_key(&query.filename);
    let url = presigned_put_url(
        &state.config.aws,
        &key,
        &query.content_type,
        chrono::Utc::now(),
    );
    Ok(Json(PresignedResponse { url, key }))
}

#[derive(Deserialize)]
struct SpotlightQuery {
    claim_id: i64,
}

/// Proxy the claim card rendered by spotlightd.
async fn spotlight(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<SpotlightQuery>, QueryRejection>,
) -> Result<Response> {
    let query = query_or_400(query)?;
    let url = format!(
        "{}/claim/{}/spotlight",
        state.config.spotlight.url.trim_end_matches('/'),
        query.claim_id
    );

    let upstream = state
        .http
        .get(&url)
        .send()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spotlight request failed: {e}")))?;
    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!("Claim {}", query.claim_id)));
    }
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/svg+xml")
        .to_string();
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spotlight body: {e}")))?;

    Ok((
        status,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=300".to_string()),
        ],
        Body::from(bytes),
    )
        .into_response())
}
