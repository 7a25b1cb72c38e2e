// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification feed state and push device registration.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::DeviceToken;
use crate::routes::SuccessResponse;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const PLATFORMS: &[&str] = &["ios", "android"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notification", post(update_notifications))
        .route("/deviceToken", post(register_device_token))
        .route("/deviceToken/unregister", post(unregister_device_token))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotificationRequest {
    /// Single notification to mark; all of the user's when absent
    pub notification_id: Option<i64>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub seen: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateNotificationResponse {
    pub updated: u64,
}

/// Mark notifications read and/or seen.
async fn update_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    request: std::result::Result<Json<UpdateNotificationRequest>, JsonRejection>,
) -> Result<Json<UpdateNotificationResponse>> {
    let Json(request) = request?;
    if !request.read && !request.seen {
        return Err(AppError::BadRequest(
            "nothing to update: set read or seen".to_string(),
        ));
    }

    let mut updated = 0;
    if request.seen {
        updated = state.db.mark_notifications_seen(&user.address).await?;
    }
    if request.read {
        updated = state
            .db
            .mark_notification_read(&user.address, request.notification_id)
            .await?;
        if updated == 0 {
            if let Some(id) = request.notification_id {
                return Err(AppError::NotFound(format!("Notification {id}")));
            }
        }
    }

    Ok(Json(UpdateNotificationResponse { updated }))
}

#[derive(Debug, Deserialize)]
pub struct DeviceTokenRequest {
    pub token: String,
    pub platform: String,
}

async fn register_device_token(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    request: std::result::Result<Json<DeviceTokenRequest>, JsonRejection>,
) -> Result<Json<DeviceToken>> {
    let Json(request) = request?;
    let platform = request.platform.to_ascii_lowercase();
    if request.token.trim().is_empty() || !PLATFORMS.contains(&platform.as_str()) {
        return Err(AppError::BadRequest(
            "token and platform (ios or android) are required".to_string(),
        ));
    }

    let token = state
        .db
        .upsert_device_token(&user.address, request.token.trim(), &platform)
        .await?;
    tracing::info!(address = %user.address, platform = %platform, "Device token registered");
    Ok(Json(token))
}

#[derive(Debug, Deserialize)]
pub struct UnregisterDeviceTokenRequest {
    pub token: String,
}

async fn unregister_device_token(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    request: std::result::Result<Json<UnregisterDeviceTokenRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let Json(request) = request?;
    state
        .db
        .remove_device_token(&user.address, request.token.trim())
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}
