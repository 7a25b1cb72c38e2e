// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stories (claims) flagged by users for moderation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FlaggedStory {
    pub story_id: i64,
    pub creator: String,
    pub created_on: DateTime<Utc>,
}
