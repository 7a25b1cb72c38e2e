// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client analytics events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackEvent {
    pub id: i64,
    pub address: Option<String>,
    pub session_id: Option<String>,
    pub event: String,
    pub claim_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
