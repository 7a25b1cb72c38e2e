// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Off-chain comments on claims and arguments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub claim_id: i64,
    pub argument_id: Option<i64>,
    pub body: String,
    /// Creator address
    pub creator: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub parent_id: Option<i64>,
    pub claim_id: i64,
    pub argument_id: Option<i64>,
    pub body: String,
    pub creator: String,
}
