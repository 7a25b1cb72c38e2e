// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Forwards new comments from truapi to pushd.

use tokio::sync::mpsc;

use crate::push::CommentNotificationRequest;

const QUEUE_CAPACITY: usize = 128;

/// Handle for queueing comment notification requests.
///
/// A disabled notifier drops requests, which is what tests and deployments
/// without pushd use.
#[derive(Clone, Default)]
pub struct CommentNotifier {
    tx: Option<mpsc::Sender<CommentNotificationRequest>>,
}

impl CommentNotifier {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Notifier whose requests arrive on the returned receiver.
    pub fn channel() -> (Self, mpsc::Receiver<CommentNotificationRequest>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        (Self { tx: Some(tx) }, rx)
    }

    /// Spawn a task that posts each request to `{endpoint_url}/sendCommentNotification`.
    pub fn spawn(http: reqwest::Client, endpoint_url: &str) -> Self {
        let (notifier, rx) = Self::channel();
        let url = format!(
            "{}/sendCommentNotification",
            endpoint_url.trim_end_matches('/')
        );
        tokio::spawn(forward(http, url, rx));
        notifier
    }

    /// Queue a request without waiting; a full queue drops it.
    pub fn notify(&self, request: CommentNotificationRequest) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(e) = tx.try_send(request) {
            tracing::warn!(error = %e, "Dropping comment notification");
        }
    }
}

async fn forward(
    http: reqwest::Client,
    url: String,
    mut rx: mpsc::Receiver<CommentNotificationRequest>,
) {
    while let Some(request) = rx.recv().await {
        let result = http.post(&url).json(&request).send().await;
        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(comment_id = request.id, "Comment notification sent");
            }
            Ok(response) => tracing::warn!(
                comment_id = request.id,
                status = response.status().as_u16(),
                "pushd rejected comment notification"
            ),
            Err(e) => tracing::warn!(
                comment_id = request.id,
                error = %e,
                "Failed to reach pushd"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn request(id: i64) -> CommentNotificationRequest {
        CommentNotificationRequest {
            id,
            claim_id: 1,
            argument_id: None,
            creator: "cosmos1a".to_string(),
            body: "hi".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_channel_delivers() {
        let (notifier, mut rx) = CommentNotifier::channel();
        notifier.notify(request(5));
        assert_eq!(rx.recv().await.unwrap().id, 5);
    }

    #[test]
    fn test_disabled_drops() {
        CommentNotifier::disabled().notify(request(1));
    }
}
