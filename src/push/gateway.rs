// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Third-party push delivery.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PushError;

/// One push message in Expo's JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Device token
    pub to: String,
    pub title: String,
    pub body: String,
    pub badge: i64,
    pub sound: String,
    /// Deep-link payload for the app
    pub data: serde_json::Value,
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// Expo's reply to a single message.
#[derive(Debug, Deserialize)]
struct PushReceipt {
    data: PushTicket,
}

#[derive(Debug, Deserialize)]
struct PushTicket {
    status: String,
    #[serde(default)]
    message: String,
}

/// Posts messages to an Expo-compatible push endpoint.
pub struct ExpoGateway {
    http: reqwest::Client,
    url: String,
}

impl ExpoGateway {
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl PushGateway for ExpoGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let response = self
            .http
            .post(&self.url)
            .header("accept", "application/json")
            .json(message)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PushError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        // Gateways that answer without a ticket count as delivered.
        match serde_json::from_str::<PushReceipt>(&body) {
            Ok(receipt) if receipt.data.status == "error" => {
                Err(PushError::Rejected(receipt.data.message))
            }
            _ => Ok(()),
        }
    }
}

/// Records messages instead of delivering them.
#[derive(Default)]
pub struct MemoryGateway {
    sent: Mutex<Vec<PushMessage>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl PushGateway for MemoryGateway {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }
}
