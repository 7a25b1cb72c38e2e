// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transaction events from Tendermint `block_results`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::ChainError;

/// Events of one successful transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TxEvent {
    pub height: i64,
    /// Value of the `message.action` attribute, e.g. `create-argument`.
    pub action: String,
    /// Decoded result data (JSON of the created object).
    pub data: Vec<u8>,
    /// All event attributes as decoded `(key, value)` pairs.
    pub attributes: Vec<(String, String)>,
}

impl TxEvent {
    /// First attribute with the given key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse the result data as JSON.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, ChainError> {
        serde_json::from_slice(&self.data)
            .map_err(|e| ChainError::Decode(format!("tx data at height {}: {e}", self.height)))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockResults {
    #[serde(default)]
    pub txs_results: Option<Vec<TxResult>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxResult {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAttribute {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Attribute text that older nodes send base64 encoded.
fn decode_attribute(raw: &str) -> String {
    STANDARD
        .decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .filter(|s| !s.is_empty() && !s.chars().any(char::is_control))
        .unwrap_or_else(|| raw.to_string())
}

impl BlockResults {
    /// Convert raw results into events, skipping failed transactions,
    /// transactions without a message action and transactions whose result
    /// data is not valid base64.
    pub(crate) fn into_events(self, height: i64) -> Vec<TxEvent> {
        let mut events = Vec::new();
        for (index, tx) in self.txs_results.unwrap_or_default().into_iter().enumerate() {
            if tx.code != 0 {
                continue;
            }
            let data = match tx.data.as_deref() {
                Some(d) if !d.is_empty() => match STANDARD.decode(d) {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::warn!(
                            height,
                            tx = index,
                            error = %e,
                            "Skipping tx with undecodable data"
                        );
                        continue;
                    }
                },
                _ => Vec::new(),
            };

            let mut action = None;
            let mut attributes = Vec::new();
            for event in tx.events {
                for attr in event.attributes {
                    let key = decode_attribute(&attr.key);
                    let value = attr.value.as_deref().map(decode_attribute).unwrap_or_default();
                    if event.kind == "message" && key == "action" && action.is_none() {
                        action = Some(value.clone());
                    }
                    attributes.push((key, value));
                }
            }

            if let Some(action) = action {
                events.push(TxEvent {
                    height,
                    action,
                    data,
                    attributes,
                });
            }
        }
        events
    }
}
