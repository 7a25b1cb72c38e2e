// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration and user lookup.

use crate::error::{AppError, Result};
use crate::mentions::is_address;
use crate::middleware::session::{
    login_cookie, referrer_cookie, signed_up_cookie, REFERRER_COOKIE,
};
use crate::middleware::AuthUser;
use crate::models::{NewUser, User};
use crate::routes::query_or_400;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

/// Maximum results of a username search.
const SEARCH_LIMIT: i64 = 10;

pub fn routes(mock_registration: bool) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/register", post(register))
        .route("/user", get(current_user))
        .route("/user/search", get(search_users));
    if mock_registration {
        router.route("/mock_register", post(mock_register))
    } else {
        router
    }
}

/// The session user's own profile.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: i64,
    pub address: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar_url: String,
    pub bio: String,
    pub invites_left: i32,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            address: user.address,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            avatar_url: user.avatar_url,
            bio: user.bio,
            invites_left: user.invites_left,
            created_at: user.created_at,
        }
    }
}

/// Fields visible to other users.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicUser {
    pub address: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            address: user.address,
            username: user.username,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
        }
    }
}

// ─── Registration ────────────────────────────────────────────

fn validate_address(address: &str) -> std::result::Result<(), ValidationError> {
    if is_address(address) {
        Ok(())
    } else {
        Err(ValidationError::new("address"))
    }
}

/// 3-15 letters, digits or underscores; the same alphabet mentions use.
fn validate_username(username: &str) -> std::result::Result<(), ValidationError> {
    let valid = (3..=15).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !username.starts_with("cosmos1");
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("username"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(custom(function = "validate_address"))]
    pub address: String,
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 1, max = 64))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 512))]
    pub avatar_url: String,
    /// Username or address of the referring user
    pub referrer: Option<String>,
}

/// Resolve a referral code to the referrer's address.
async fn resolve_referrer(state: &AppState, referrer: &str) -> Result<Option<String>> {
    if is_address(referrer) {
        return Ok(state
            .db
            .user_by_address(referrer)
            .await?
            .map(|u| u.address));
    }
    Ok(state
        .db
        .user_by_username(referrer)
        .await?
        .map(|u| u.address))
}

/// Create an account and log it in.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: std::result::Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<UserResponse>)> {
    let Json(request) = request?;
    request.validate()?;

    let referrer = request
        .referrer
        .clone()
        .filter(|r| !r.is_empty())
        .or_else(|| jar.get(REFERRER_COOKIE).map(|c| c.value().to_string()));
    let referred_by = match referrer {
        Some(code) => resolve_referrer(&state, &code).await?,
        None => None,
    };

    let user = state
        .db
        .add_user(NewUser {
            address: request.address,
            username: request.username,
            full_name: request.full_name.trim().to_string(),
            email: request.email,
            avatar_url: request.avatar_url,
            referred_by,
        })
        .await?;

    tracing::info!(user_id = user.id, address = %user.address, "User registered");

    let mut used_referrer = referrer_cookie(&state.config, "");
    used_referrer.set_max_age(time::Duration::ZERO);
    let jar = log_in(&state, jar, &user)?
        .add(signed_up_cookie(&state.config))
        .add(used_referrer);
    Ok((jar, Json(user.into())))
}

fn log_in(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar> {
    let cookie = login_cookie(&state.config, user)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("session cookie: {e}")))?;
    Ok(jar.add(cookie))
}

/// Throwaway account for local development.
async fn mock_register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<UserResponse>)> {
    let seed = format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );
    let address = format!("cosmos1{}", &seed[..38]);
    let username = format!("mock_{}", &seed[..8]);

    let user = state
        .db
        .add_user(NewUser {
            address,
            email: format!("{username}@example.com"),
            full_name: "Mock User".to_string(),
            username,
            avatar_url: String::new(),
            referred_by: None,
        })
        .await?;

    tracing::info!(user_id = user.id, "Mock user registered");
    let jar = log_in(&state, jar, &user)?;
    Ok((jar, Json(user.into())))
}

// ─── Lookup ──────────────────────────────────────────────────

async fn current_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .user_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.id)))?;
    Ok(Json(profile.into()))
}

#[derive(Deserialize)]
struct SearchQuery {
    username_prefix: String,
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<PublicUser>>> {
    let query = query_or_400(query)?;
    let prefix = query.username_prefix.trim();
    if prefix.is_empty() {
        return Err(AppError::BadRequest("username_prefix is required".to_string()));
    }
    let users = state.db.search_users_by_prefix(prefix, SEARCH_LIMIT).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("alice_99").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("waytoolongusername").is_err());
    }

    #[test]
    fn test_registration_validation() {
        let request = RegistrationRequest {
            address: "cosmos1xqc5gwzpg3fyv5en2fzyx36z2se5ks33tt57e7".to_string(),
            username: "alice".to_string(),
            full_name: "Alice".to_string(),
            email: "not-an-email".to_string(),
            avatar_url: String::new(),
            referrer: None,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
