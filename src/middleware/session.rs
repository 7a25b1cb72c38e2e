// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookies.
//!
//! The login cookie `tru-user` and the anonymous tracking cookie
//! `tru-session` both carry HS256 JWTs signed with the cookie hash key.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{Config, ANONYMOUS_SESSION_DURATION, AUTHENTICATED_SESSION_DURATION};
use crate::error::AppError;
use crate::models::User;
use crate::AppState;

pub const USER_COOKIE: &str = "tru-user";
pub const REFERRER_COOKIE: &str = "tru-referrer";
pub const ANON_SESSION_COOKIE: &str = "tru-session";
pub const SIGNED_UP_COOKIE: &str = "sign-up";

/// Header set by the mobile apps, which never get a tracking cookie.
pub const MOBILE_REQUEST_HEADER: &str = "x-mobile-request";

const SIGNED_UP_LIFETIME: time::Duration = time::Duration::minutes(5);
const REFERRER_LIFETIME: time::Duration = time::Duration::seconds(120);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    /// Cookies from the old Twitter login carried no user id.
    #[error("legacy cookie")]
    Legacy,

    #[error("stale session")]
    Stale,

    #[error("clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

/// Login cookie payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    /// User id
    pub sub: i64,
    pub address: String,
    pub iat: u64,
    pub exp: u64,
}

/// Anonymous session payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnonymousClaims {
    pub sid: String,
    pub iat: u64,
    pub exp: u64,
}

/// Logged-in user attached to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub address: String,
}

/// Anonymous tracking session attached to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousSession {
    pub session_id: String,
}

fn now_secs() -> Result<u64, SessionError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn to_time(duration: std::time::Duration) -> time::Duration {
    time::Duration::seconds(duration.as_secs() as i64)
}

fn base_cookie(config: &Config, name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.host.public_url.starts_with("https://"))
        .build();
    if !config.host.domain.is_empty() {
        cookie.set_domain(config.host.domain.clone());
    }
    cookie
}

/// Encode a login token issued at `issued_at` (seconds since the epoch).
pub fn encode_login_value_at(
    id: i64,
    address: &str,
    issued_at: u64,
    key: &[u8],
) -> Result<String, SessionError> {
    let claims = UserClaims {
        sub: id,
        address: address.to_string(),
        iat: issued_at,
        exp: issued_at + AUTHENTICATED_SESSION_DURATION.as_secs(),
    };
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(key),
    )?)
}

pub fn encode_login_value(user: &User, key: &[u8]) -> Result<String, SessionError> {
    encode_login_value_at(user.id, &user.address, now_secs()?, key)
}

/// Decode a login token, rejecting legacy and stale sessions.
pub fn decode_login_value(value: &str, key: &[u8]) -> Result<AuthUser, SessionError> {
    let data = decode::<UserClaims>(value, &DecodingKey::from_secret(key), &validation())
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Stale,
            _ => SessionError::Invalid(e),
        })?;
    let claims = data.claims;

    if claims.sub == 0 {
        return Err(SessionError::Legacy);
    }
    if claims.iat + AUTHENTICATED_SESSION_DURATION.as_secs() < now_secs()? {
        return Err(SessionError::Stale);
    }

    Ok(AuthUser {
        id: claims.sub,
        address: claims.address,
    })
}

pub fn login_cookie(config: &Config, user: &User) -> Result<Cookie<'static>, SessionError> {
    let value = encode_login_value(user, &config.cookie.hash_key)?;
    let mut cookie = base_cookie(config, USER_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_max_age(to_time(AUTHENTICATED_SESSION_DURATION));
    Ok(cookie)
}

/// Overwrites the login cookie so the browser drops it.
pub fn logout_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = base_cookie(config, USER_COOKIE, String::new());
    cookie.set_http_only(true);
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

/// Short-lived flag the web app reads right after registration.
pub fn signed_up_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = base_cookie(config, SIGNED_UP_COOKIE, "true".to_string());
    cookie.set_max_age(SIGNED_UP_LIFETIME);
    cookie
}

/// Carries a referral code across the sign-up redirect.
pub fn referrer_cookie(config: &Config, referrer: &str) -> Cookie<'static> {
    let mut cookie = base_cookie(config, REFERRER_COOKIE, referrer.to_string());
    cookie.set_http_only(true);
    cookie.set_max_age(REFERRER_LIFETIME);
    cookie
}

pub fn decode_anonymous_value(value: &str, key: &[u8]) -> Result<AnonymousSession, SessionError> {
    let data = decode::<AnonymousClaims>(value, &DecodingKey::from_secret(key), &validation())
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Stale,
            _ => SessionError::Invalid(e),
        })?;
    Ok(AnonymousSession {
        session_id: data.claims.sid,
    })
}

/// New anonymous session with a random id.
pub fn anonymous_session_cookie(
    config: &Config,
) -> Result<(Cookie<'static>, AnonymousSession), SessionError> {
    let now = now_secs()?;
    let claims = AnonymousClaims {
        sid: uuid::Uuid::new_v4().to_string(),
        iat: now,
        exp: now + ANONYMOUS_SESSION_DURATION.as_secs(),
    };
    let value = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&config.cookie.hash_key),
    )?;
    let mut cookie = base_cookie(config, ANON_SESSION_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_max_age(to_time(ANONYMOUS_SESSION_DURATION));
    Ok((
        cookie,
        AnonymousSession {
            session_id: claims.sid,
        },
    ))
}

fn append_cookie(response: &mut Response, cookie: &Cookie<'_>) {
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// Attach [`AuthUser`] when the request carries a valid login cookie.
///
/// Requests without one continue anonymously; handlers that need a user
/// reject them through the extractor.
pub async fn attach_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(USER_COOKIE) {
        match decode_login_value(cookie.value(), &state.config.cookie.hash_key) {
            Ok(user) => {
                request.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring login cookie"),
        }
    }
    next.run(request).await
}

/// Issue or refresh the anonymous tracking cookie.
pub async fn anonymous_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let is_mobile = request
        .headers()
        .get(MOBILE_REQUEST_HEADER)
        .is_some_and(|v| v.as_bytes() == b"true");

    if is_mobile {
        let mut response = next.run(request).await;
        let mut expired = base_cookie(&state.config, ANON_SESSION_COOKIE, String::new());
        expired.set_http_only(true);
        expired.set_max_age(time::Duration::ZERO);
        append_cookie(&mut response, &expired);
        return response;
    }

    let existing = jar
        .get(ANON_SESSION_COOKIE)
        .and_then(|c| decode_anonymous_value(c.value(), &state.config.cookie.hash_key).ok());
    if let Some(session) = existing {
        request.extensions_mut().insert(session);
        return next.run(request).await;
    }

    match anonymous_session_cookie(&state.config) {
        Ok((cookie, session)) => {
            request.extensions_mut().insert(session);
            let mut response = next.run(request).await;
            append_cookie(&mut response, &cookie);
            response
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create anonymous session");
            next.run(request).await
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for AnonymousSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AnonymousSession>().cloned())
    }
}
