// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! pushd HTTP surface.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::{CommentNotificationRequest, EventProcessor};
use crate::error::{AppError, Result};
use crate::routes::HealthResponse;

pub fn create_router(processor: Arc<EventProcessor>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sendCommentNotification", post(send_comment_notification))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(processor)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

async fn send_comment_notification(
    State(processor): State<Arc<EventProcessor>>,
    payload: std::result::Result<Json<CommentNotificationRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<StatusCode> {
    let Json(request) = payload?;
    tracing::info!(
        comment_id = request.id,
        claim_id = request.claim_id,
        "Comment notification requested"
    );
    processor
        .process_comment_notification(request)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryChain;
    use crate::db::{Datastore, MemoryDatastore};
    use crate::models::NewComment;
    use axum::body::Body;
    use axum::http::Request;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_send_comment_notification_queues() {
        let db = Arc::new(MemoryDatastore::new());
        db.add_comment(NewComment {
            parent_id: None,
            claim_id: 3,
            argument_id: Some(4),
            body: "first".to_string(),
            creator: "cosmos1first".to_string(),
        })
        .await
        .unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let processor = Arc::new(EventProcessor::new(db, Arc::new(MemoryChain::new()), tx));
        let app = create_router(processor);

        let body = serde_json::json!({
            "id": 2,
            "claim_id": 3,
            "argument_id": 4,
            "creator": "cosmos1second",
            "body": "reply",
            "timestamp": "2019-08-01T10:00:00Z"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sendCommentNotification")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.to, "cosmos1first");
        assert_eq!(queued.msg, "added a comment: reply");
    }

    #[tokio::test]
    async fn test_bad_body_is_rejected() {
        let (tx, _rx) = mpsc::channel(1);
        let processor = Arc::new(EventProcessor::new(
            Arc::new(MemoryDatastore::new()),
            Arc::new(MemoryChain::new()),
            tx,
        ));
        let response = create_router(processor)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sendCommentNotification")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
