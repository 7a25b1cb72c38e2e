// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Push notification pipeline (pushd).
//!
//! ```text
//! BlockPoller ──> EventProcessor ──mpsc──> NotificationSender ──> PushGateway
//!                      ^
//!   POST /sendCommentNotification
//! ```
//!
//! A single channel carries [`Notification`] values to one sender task.
//! Delivery is best effort: failures are logged and dropped.

pub mod gateway;
pub mod poller;
pub mod processor;
pub mod sender;
pub mod server;

pub use gateway::{ExpoGateway, MemoryGateway, PushGateway, PushMessage};
pub use poller::BlockPoller;
pub use processor::EventProcessor;
pub use sender::{trim_message, NotificationSender};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::ChainError;
use crate::db::DbError;
use crate::models::{NotificationMeta, NotificationType};

/// Capacity of the notification channel.
pub const CHANNEL_CAPACITY: usize = 256;

/// A notification on its way to one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Sender address, absent for system notifications
    pub from: Option<String>,
    /// Recipient address
    pub to: String,
    pub msg: String,
    pub type_id: i64,
    pub notification_type: NotificationType,
    pub meta: NotificationMeta,
    /// Push title
    pub action: String,
    /// Collapse and shorten `msg` before delivery
    pub trim: bool,
}

/// Sent by truapi after a comment is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNotificationRequest {
    /// Comment id
    pub id: i64,
    pub claim_id: i64,
    pub argument_id: Option<i64>,
    pub creator: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },

    /// The gateway accepted the request but refused the message.
    #[error("gateway rejected message: {0}")]
    Rejected(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
