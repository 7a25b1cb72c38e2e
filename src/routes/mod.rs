// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod content;
pub mod graphql;
pub mod metrics;
pub mod notifications;
pub mod uploads;
pub mod users;
pub mod web;

use crate::error::{AppError, Result};
use crate::middleware::{anonymous_session, attach_user};
use crate::AppState;
use axum::extract::{rejection::QueryRejection, Query};
use axum::http::{header, HeaderName, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
        }
    }
}

/// Body of handlers with nothing else to report.
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Unwrap query parameters, answering 400 when they do not parse.
pub(crate) fn query_or_400<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(q)| q)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[derive(Serialize)]
pub struct PingResponse {
    pub pong: bool,
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse { pong: true })
}

/// Routes mounted under `/api/v1`.
fn api_routes(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(ping))
        .merge(graphql::routes())
        .merge(users::routes(state.config.app.mock_registration))
        .merge(notifications::routes())
        .merge(content::routes())
        .merge(metrics::routes())
        .merge(uploads::routes())
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.web.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(crate::middleware::session::MOBILE_REQUEST_HEADER),
        ]);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(&state))
        .merge(web::routes())
        .fallback(web::serve_web_app)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            anonymous_session,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), attach_user))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
