// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Logout redirect and the React web app.

use crate::middleware::session::logout_cookie;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Cookie that selects the v2 web build.
pub const WEB_VERSION_COOKIE: &str = "web_version";

/// Policy for the web app documents.
const WEB_CSP: &str = "default-src 'self'; img-src 'self' https: data:; \
     style-src 'self' 'unsafe-inline'; connect-src 'self' https:; frame-ancestors 'none'";

const DEFAULT_TITLE: &str = "TruStory";
const DEFAULT_DESCRIPTION: &str = "TruStory is a social network to debate claims with skin in the game";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth-logout", get(logout))
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let jar = jar.add(logout_cookie(&state.config));
    (
        StatusCode::FOUND,
        jar,
        [(header::LOCATION, state.config.web.auth_logout_redir.clone())],
    )
        .into_response()
}

/// Open Graph values substituted into `index.html`.
#[derive(Debug, PartialEq)]
pub struct MetaTags {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Replace the `$PLACEHOLDER__*` markers of the index page.
pub fn compile_index(index: &str, tags: &MetaTags) -> String {
    index
        .replace("$PLACEHOLDER__TITLE", &escape_html(&tags.title))
        .replace("$PLACEHOLDER__DESCRIPTION", &escape_html(&tags.description))
        .replace("$PLACEHOLDER__IMAGE", &escape_html(&tags.image))
        .replace("$PLACEHOLDER__URL", &escape_html(&tags.url))
}

/// Claim id of a `/claim/{id}` path.
fn claim_id_from_path(path: &str) -> Option<i64> {
    let mut segments = path.trim_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some("claim"), Some(id)) => id.parse().ok(),
        _ => None,
    }
}

/// Meta tags for `path`, describing the claim on claim pages.
pub async fn meta_tags(state: &AppState, path: &str) -> MetaTags {
    let base = state.config.host.public_url.trim_end_matches('/');
    let mut tags = MetaTags {
        title: DEFAULT_TITLE.to_string(),
        description: DEFAULT_DESCRIPTION.to_string(),
        image: format!("{base}/og-image.png"),
        url: format!("{base}{path}"),
    };

    let Some(claim_id) = claim_id_from_path(path) else {
        return tags;
    };
    match state.chain.claim(claim_id).await {
        Ok(claim) => {
            tags.title = claim.body;
            tags.description = format!(
                "{} backed, {} challenged",
                claim.total_backed.display(),
                claim.total_challenged.display()
            );
            tags.image = format!("{base}/api/v1/spotlight?claim_id={claim_id}");
        }
        Err(e) => tracing::debug!(claim_id, error = %e, "No claim for meta tags"),
    }
    tags
}

/// Serve the web app; extensionless paths get the compiled `index.html`.
pub async fn serve_web_app(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
) -> Response {
    let directory = match jar.get(WEB_VERSION_COOKIE) {
        Some(cookie) if cookie.value() == "2" => &state.config.web.directory_v2,
        _ => &state.config.web.directory,
    };

    let path = request.uri().path().to_string();
    let has_extension = Path::new(&path).extension().is_some();
    if has_extension {
        return match ServeDir::new(directory).oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(e) => match e {},
        };
    }

    let index_path = Path::new(directory).join("index.html");
    let index = match tokio::fs::read_to_string(&index_path).await {
        Ok(index) => index,
        Err(e) => {
            tracing::error!(path = %index_path.display(), error = %e, "Error serving index.html");
            return (StatusCode::NOT_FOUND, "Error serving index.html").into_response();
        }
    };

    let tags = meta_tags(&state, &path).await;
    (
        [(header::CONTENT_SECURITY_POLICY, WEB_CSP)],
        Html(compile_index(&index, &tags)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_id_from_path() {
        assert_eq!(claim_id_from_path("/claim/42"), Some(42));
        assert_eq!(claim_id_from_path("/claim/42/"), Some(42));
        assert_eq!(claim_id_from_path("/claim/abc"), None);
        assert_eq!(claim_id_from_path("/feed"), None);
    }

    #[test]
    fn test_compile_index_escapes() {
        let index = "<title>$PLACEHOLDER__TITLE</title><meta content=\"$PLACEHOLDER__URL\">";
        let tags = MetaTags {
            title: "Is <b>this</b> true?".to_string(),
            description: String::new(),
            image: String::new(),
            url: "https://x.test/claim/1?a=1&b=2".to_string(),
        };
        assert_eq!(
            compile_index(index, &tags),
            "<title>Is &lt;b&gt;this&lt;/b&gt; true?</title>\
             <meta content=\"https://x.test/claim/1?a=1&amp;b=2\">"
        );
    }
}
