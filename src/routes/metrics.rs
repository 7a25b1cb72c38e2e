// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User metrics, event tracking and the claim of the day.

use crate::error::{AppError, Result};
use crate::middleware::{AnonymousSession, AuthUser};
use crate::models::{TrackEvent, UserMetric};
use crate::routes::query_or_400;
use crate::time_utils::parse_date;
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/metrics/users", get(user_metrics))
        .route("/track", post(track))
        .route("/track/", post(track))
        .route("/claim_of_the_day", get(claim_of_the_day))
}

// ─── User metrics ────────────────────────────────────────────

#[derive(Deserialize)]
struct MetricsQuery {
    address: String,
    from: String,
    to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserMetricsResponse {
    pub address: String,
    pub metrics: Vec<UserMetric>,
}

/// Daily metrics of an address summed per community, `from` and `to` inclusive.
async fn user_metrics(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<MetricsQuery>, QueryRejection>,
) -> Result<Json<UserMetricsResponse>> {
    let query = query_or_400(query)?;
    let (Some(from), Some(to)) = (parse_date(&query.from), parse_date(&query.to)) else {
        return Err(AppError::BadRequest(
            "from and to must be YYYY-MM-DD dates".to_string(),
        ));
    };
    if from > to {
        return Err(AppError::BadRequest("from is after to".to_string()));
    }

    let metrics = state
        .db
        .aggregate_user_metrics(&query.address, from, to)
        .await?;
    Ok(Json(UserMetricsResponse {
        address: query.address,
        metrics,
    }))
}

// ─── Tracking ────────────────────────────────────────────────

#[derive(Deserialize)]
struct TrackQuery {
    event: String,
    claim_id: Option<i64>,
}

async fn track(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    session: Option<AnonymousSession>,
    query: std::result::Result<Query<TrackQuery>, QueryRejection>,
) -> Result<Json<TrackEvent>> {
    let query = query_or_400(query)?;
    if query.event.trim().is_empty() {
        return Err(AppError::BadRequest("event is required".to_string()));
    }

    let event = state
        .db
        .add_track_event(
            user.as_ref().map(|u| u.address.as_str()),
            session.as_ref().map(|s| s.session_id.as_str()),
            query.event.trim(),
            query.claim_id,
        )
        .await?;
    Ok(Json(event))
}

// ─── Claim of the day ────────────────────────────────────────

#[derive(Deserialize)]
struct ClaimOfTheDayQuery {
    community_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimOfTheDayResponse {
    pub claim_id: i64,
}

async fn claim_of_the_day(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<ClaimOfTheDayQuery>, QueryRejection>,
) -> Result<Json<ClaimOfTheDayResponse>> {
    let query = query_or_400(query)?;
    let claim_id = state
        .db
        .claim_of_the_day(&query.community_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No claim of the day for {}", query.community_id))
        })?;
    Ok(Json(ClaimOfTheDayResponse { claim_id }))
}
