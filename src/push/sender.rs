// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stores notifications and delivers them to devices.

use std::sync::Arc;

use futures_util::{stream, StreamExt};
use tokio::sync::mpsc;

use super::gateway::{PushGateway, PushMessage};
use super::{Notification, PushError};
use crate::db::Datastore;
use crate::models::NewNotificationEvent;

/// Longest message body kept when a notification asks to be trimmed.
pub const MAX_MESSAGE_CHARS: usize = 140;

/// Concurrent gateway requests per notification.
const DELIVERY_CONCURRENCY: usize = 4;

/// Collapse whitespace and cut to [`MAX_MESSAGE_CHARS`], ending with an
/// ellipsis when shortened.
pub fn trim_message(msg: &str) -> String {
    let collapsed = msg.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_MESSAGE_CHARS {
        return collapsed;
    }
    let mut trimmed: String = collapsed.chars().take(MAX_MESSAGE_CHARS - 3).collect();
    trimmed.truncate(trimmed.trim_end().len());
    trimmed.push_str("...");
    trimmed
}

/// Consumer end of the notification channel.
pub struct NotificationSender {
    db: Arc<dyn Datastore>,
    gateway: Arc<dyn PushGateway>,
}

impl NotificationSender {
    pub fn new(db: Arc<dyn Datastore>, gateway: Arc<dyn PushGateway>) -> Self {
        Self { db, gateway }
    }

    /// Deliver notifications until every producer has dropped its sender.
    pub async fn run(self, mut rx: mpsc::Receiver<Notification>) {
        while let Some(notification) = rx.recv().await {
            let to = notification.to.clone();
            if let Err(e) = self.send(notification).await {
                tracing::error!(to = %to, error = %e, "Failed to send notification");
            }
        }
        tracing::info!("Notification channel closed, sender stopping");
    }

    /// Store one notification and push it to every device of the recipient.
    pub async fn send(&self, notification: Notification) -> Result<(), PushError> {
        let msg = if notification.trim {
            trim_message(&notification.msg)
        } else {
            notification.msg
        };

        let event = self
            .db
            .add_notification_event(NewNotificationEvent {
                address: notification.to.clone(),
                sender_address: notification.from.clone(),
                message: msg.clone(),
                type_id: notification.type_id,
                notification_type: notification.notification_type,
                meta: notification.meta.clone(),
            })
            .await?;

        let tokens = self.db.device_tokens_by_address(&notification.to).await?;
        if tokens.is_empty() {
            tracing::debug!(to = %notification.to, "No device tokens, stored only");
            return Ok(());
        }

        let body = match &notification.from {
            Some(from) => match self.db.user_by_address(from).await? {
                Some(sender) => format!("{} {}", sender.username, msg),
                None => msg,
            },
            None => msg,
        };
        let badge = self
            .db
            .unseen_notifications_count(&notification.to)
            .await?;
        let data = serde_json::json!({
            "id": event.id,
            "type_id": event.type_id,
            "type": event.notification_type,
            "meta": event.meta.0,
        });

        let messages: Vec<PushMessage> = tokens
            .into_iter()
            .map(|t| PushMessage {
                to: t.token,
                title: notification.action.clone(),
                body: body.clone(),
                badge,
                sound: "default".to_string(),
                data: data.clone(),
            })
            .collect();

        let gateway = self.gateway.as_ref();
        let results: Vec<(String, Result<(), PushError>)> = stream::iter(messages)
            .map(|m| async move {
                let result = gateway.send(&m).await;
                (m.to, result)
            })
            .buffer_unordered(DELIVERY_CONCURRENCY)
            .collect()
            .await;

        for (token, result) in results {
            if let Err(e) = result {
                tracing::warn!(to = %notification.to, token = %token, error = %e, "Push delivery failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDatastore;
    use crate::models::{NewUser, NotificationMeta, NotificationType};
    use crate::push::MemoryGateway;

    #[test]
    fn test_trim_collapses_whitespace() {
        assert_eq!(trim_message("  a\n\n b\t c  "), "a b c");
    }

    #[test]
    fn test_trim_shortens_long_messages() {
        let long = "word ".repeat(60);
        let trimmed = trim_message(&long);
        assert!(trimmed.chars().count() <= MAX_MESSAGE_CHARS);
        assert!(trimmed.ends_with("..."));
        assert!(!trimmed.ends_with(" ..."));
    }

    #[test]
    fn test_trim_exactly_max_is_untouched() {
        let exact = "x".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(trim_message(&exact), exact);
    }

    fn notification(trim: bool, msg: &str) -> Notification {
        Notification {
            from: Some("cosmos1sender".to_string()),
            to: "cosmos1recipient".to_string(),
            msg: msg.to_string(),
            type_id: 7,
            notification_type: NotificationType::AgreeReceived,
            meta: NotificationMeta {
                claim_id: Some(1),
                argument_id: Some(7),
                ..NotificationMeta::default()
            },
            action: "Agree Received".to_string(),
            trim,
        }
    }

    #[tokio::test]
    async fn test_send_stores_and_pushes_to_every_device() {
        let db = Arc::new(MemoryDatastore::new());
        db.add_user(NewUser {
            address: "cosmos1sender".to_string(),
            username: "sender".to_string(),
            full_name: String::new(),
            email: "sender@example.com".to_string(),
            avatar_url: String::new(),
            referred_by: None,
        })
        .await
        .unwrap();
        db.upsert_device_token("cosmos1recipient", "token-a", "ios")
            .await
            .unwrap();
        db.upsert_device_token("cosmos1recipient", "token-b", "android")
            .await
            .unwrap();
        let gateway = Arc::new(MemoryGateway::new());
        let sender = NotificationSender::new(db.clone(), gateway.clone());

        sender
            .send(notification(true, "agreed   with\nyour argument"))
            .await
            .unwrap();

        let stored = db
            .notification_events_by_address("cosmos1recipient")
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].message, "agreed with your argument");
        assert_eq!(stored[0].sender_address.as_deref(), Some("cosmos1sender"));

        let mut sent = gateway.sent();
        sent.sort_by(|a, b| a.to.cmp(&b.to));
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "token-a");
        assert_eq!(sent[1].to, "token-b");
        assert_eq!(sent[0].body, "sender agreed with your argument");
        assert_eq!(sent[0].title, "Agree Received");
        assert_eq!(sent[0].badge, 1);
        assert_eq!(sent[0].data["meta"]["claim_id"], 1);
    }

    #[tokio::test]
    async fn test_send_without_devices_only_stores() {
        let db = Arc::new(MemoryDatastore::new());
        let gateway = Arc::new(MemoryGateway::new());
        let sender = NotificationSender::new(db.clone(), gateway.clone());

        sender.send(notification(false, "hello")).await.unwrap();

        assert_eq!(db.unseen_notifications_count("cosmos1recipient").await.unwrap(), 1);
        assert!(gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let db = Arc::new(MemoryDatastore::new());
        let gateway = Arc::new(MemoryGateway::new());
        let sender = NotificationSender::new(db.clone(), gateway);
        let (tx, rx) = mpsc::channel(4);

        tx.send(notification(false, "one")).await.unwrap();
        tx.send(notification(false, "two")).await.unwrap();
        drop(tx);
        sender.run(rx).await;

        assert_eq!(
            db.notification_events_by_address("cosmos1recipient")
                .await
                .unwrap()
                .len(),
            2
        );
    }
}
