// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Claim share cards rendered as SVG (spotlightd).

use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::chain::{ChainQuerier, Claim};
use crate::db::Datastore;
use crate::error::Result;
use crate::routes::HealthResponse;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 630;
const MAX_LINE_CHARS: usize = 34;
const MAX_LINES: usize = 6;
const LINE_HEIGHT: u32 = 62;
const ELLIPSIS: char = '…';

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Greedy word wrap to at most `max_lines` lines of `width` characters.
///
/// Words longer than a line are split. When text is left over, the last
/// line ends with an ellipsis.
pub fn wrap_text(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut truncated = false;

    'words: for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let current_len = current.chars().count();
            let needed = if current.is_empty() {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.extend(word.iter());
                continue 'words;
            }
            if current.is_empty() {
                // Word alone is wider than a line.
                let rest = word.split_off(width);
                current.extend(word.iter());
                word = rest;
            }
            if lines.len() + 1 == max_lines {
                truncated = true;
                break 'words;
            }
            lines.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if truncated {
        if let Some(last) = lines.last_mut() {
            let mut chars: Vec<char> = last.chars().collect();
            chars.truncate(width.saturating_sub(1));
            while chars.last() == Some(&' ') {
                chars.pop();
            }
            chars.push(ELLIPSIS);
            *last = chars.into_iter().collect();
        }
    }
    lines
}

/// Render the share card of a claim.
pub fn render_claim_card(claim: &Claim, creator: &str, argument_count: usize) -> String {
    let lines = wrap_text(&claim.body, MAX_LINE_CHARS, MAX_LINES);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"##
    );
    svg.push_str(r##"<rect width="100%" height="100%" fill="#f6f4ef"/>"##);
    let _ = write!(
        svg,
        r##"<text x="80" y="90" font-family="Helvetica, Arial, sans-serif" font-size="30" fill="#6b6b6b">@{}</text>"##,
        escape_xml(creator)
    );
    svg.push_str(
        r##"<text font-family="Georgia, serif" font-size="50" font-weight="bold" fill="#1c1c1c">"##,
    );
    for (i, line) in lines.iter().enumerate() {
        let y = 170 + LINE_HEIGHT * i as u32;
        let _ = write!(svg, r#"<tspan x="80" y="{y}">{}</tspan>"#, escape_xml(line));
    }
    svg.push_str("</text>");

    let arguments = if argument_count == 1 {
        "1 argument".to_string()
    } else {
        format!("{argument_count} arguments")
    };
    let _ = write!(
        svg,
        r##"<text x="80" y="{}" font-family="Helvetica, Arial, sans-serif" font-size="28" fill="#1c1c1c">{} backed · {} challenged · {}</text>"##,
        HEIGHT - 60,
        escape_xml(&claim.total_backed.display()),
        escape_xml(&claim.total_challenged.display()),
        arguments
    );
    svg.push_str("</svg>");
    svg
}

/// What spotlightd reads from.
#[derive(Clone)]
pub struct SpotlightState {
    pub chain: Arc<dyn ChainQuerier>,
    pub db: Arc<dyn Datastore>,
}

pub fn create_router(state: SpotlightState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/claim/{id}/spotlight", get(claim_spotlight))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn claim_spotlight(
    State(state): State<SpotlightState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let claim = state.chain.claim(id).await?;
    let argument_count = state.chain.claim_arguments(id).await?.len();
    let creator = match state.db.user_by_address(&claim.creator).await? {
        Some(user) => user.username,
        None => claim.creator.clone(),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        render_claim_card(&claim, &creator, argument_count),
    ))
}
