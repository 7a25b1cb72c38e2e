// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-app notification feed records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Kind of event a notification describes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, async_graphql::Enum,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum NotificationType {
    CommentAction = 0,
    MentionAction = 1,
    NewArgument = 2,
    AgreeReceived = 3,
    NotHelpful = 4,
    Slashed = 5,
    EarnedStake = 6,
    Jailed = 7,
}

/// Where a mention happened.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, async_graphql::Enum,
)]
#[serde(rename_all = "snake_case")]
pub enum MentionType {
    Argument,
    Comment,
}

impl MentionType {
    /// Phrase used in notification text ("mentioned you in an argument").
    pub fn phrase(&self) -> &'static str {
        match self {
            MentionType::Argument => "in an argument",
            MentionType::Comment => "in a comment",
        }
    }
}

/// Deep-link data the client uses to open the right screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, async_graphql::SimpleObject)]
pub struct NotificationMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention_type: Option<MentionType>,
}

/// Stored notification.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationEvent {
    pub id: i64,
    /// Recipient address
    pub address: String,
    pub sender_address: Option<String>,
    pub message: String,
    /// Id of the object the notification is about
    pub type_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub meta: Json<NotificationMeta>,
    pub read: bool,
    pub seen: bool,
    pub timestamp: DateTime<Utc>,
}

/// Notification about to be stored.
#[derive(Debug, Clone)]
pub struct NewNotificationEvent {
    pub address: String,
    pub sender_address: Option<String>,
    pub message: String,
    pub type_id: i64,
    pub notification_type: NotificationType,
    pub meta: NotificationMeta,
}
