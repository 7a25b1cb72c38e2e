// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::Utc;
use octopus::chain::{Argument, Claim, Coin, Community, MemoryChain, StakeType, STAKE_DENOM};
use octopus::config::Config;
use octopus::db::{Datastore, MemoryDatastore};
use octopus::middleware::session::{encode_login_value, USER_COOKIE};
use octopus::models::{NewUser, User};
use octopus::push::CommentNotificationRequest;
use octopus::routes::create_router;
use octopus::services::CommentNotifier;
use octopus::AppState;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const ALICE: &str = "cosmos1xqc5gwzpg3fyv5en2fzyx36z2se5ks33tt57e7";
#[allow(dead_code)]
pub const BOB: &str = "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";

/// Postgres URL for tests that need a real database.
#[allow(dead_code)]
pub fn database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Skip test with message if no database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        match crate::common::database_url() {
            Some(url) => url,
            None => {
                eprintln!("⚠️  Skipping: DATABASE_URL not set");
                return;
            }
        }
    };
}

/// Router over in-memory stores.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub chain: Arc<MemoryChain>,
    pub comments: mpsc::Receiver<CommentNotificationRequest>,
}

/// Create a test app with offline in-memory dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let chain = Arc::new(MemoryChain::new());
    let (notifier, comments) = CommentNotifier::channel();
    let state = Arc::new(AppState::new(
        config,
        Arc::new(MemoryDatastore::new()),
        chain.clone(),
        notifier,
        reqwest::Client::new(),
    ));
    TestApp {
        router: create_router(state.clone()),
        state,
        chain,
        comments,
    }
}

#[allow(dead_code)]
pub async fn add_user(state: &AppState, address: &str, username: &str) -> User {
    state
        .db
        .add_user(NewUser {
            address: address.to_string(),
            username: username.to_string(),
            full_name: username.to_string(),
            email: format!("{username}@example.com"),
            avatar_url: String::new(),
            referred_by: None,
        })
        .await
        .unwrap()
}

/// `Cookie` header value logging in as `user`.
#[allow(dead_code)]
pub fn session_cookie(state: &AppState, user: &User) -> String {
    let value = encode_login_value(user, &state.config.cookie.hash_key).unwrap();
    format!("{USER_COOKIE}={value}")
}

/// JSON request, optionally with a `Cookie` header.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

// ─── Chain fixtures ──────────────────────────────────────────

#[allow(dead_code)]
pub fn community(id: &str) -> Community {
    Community {
        id: id.to_string(),
        name: id.to_uppercase(),
        description: String::new(),
    }
}

#[allow(dead_code)]
pub fn claim(id: i64, community_id: &str, creator: &str, body: &str) -> Claim {
    Claim {
        id,
        community_id: community_id.to_string(),
        body: body.to_string(),
        creator: creator.to_string(),
        source: String::new(),
        total_backed: Coin::new(STAKE_DENOM, 1_500_000_000),
        total_challenged: Coin::new(STAKE_DENOM, 0),
        total_stakers: 1,
        created_time: Utc::now(),
    }
}

#[allow(dead_code)]
pub fn argument(id: i64, claim_id: i64, creator: &str, summary: &str) -> Argument {
    Argument {
        id,
        creator: creator.to_string(),
        claim_id,
        summary: summary.to_string(),
        body: summary.to_string(),
        stake_type: StakeType::Backing,
        upvoted_count: 0,
        upvoted_stake: Coin::new(STAKE_DENOM, 0),
        total_stake: Coin::new(STAKE_DENOM, 0),
        edited: false,
        created_time: Utc::now(),
        updated_time: Utc::now(),
    }
}
