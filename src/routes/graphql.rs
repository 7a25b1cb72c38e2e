// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GraphQL endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/graphql", post(execute))
}

/// Execute a query with the app state and, when logged in, the session user.
async fn execute(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    request: std::result::Result<Json<async_graphql::Request>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<async_graphql::Response>> {
    let Json(mut request) = request?;
    request = request.data(state.clone());
    if let Some(user) = user {
        request = request.data(user);
    }
    Ok(Json(state.schema.execute(request).await))
}
