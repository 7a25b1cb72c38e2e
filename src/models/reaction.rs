// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reactions (likes) on arguments, claims and comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, async_graphql::Enum,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ReactionType {
    Like = 0,
}

/// The object a reaction targets, e.g. `{"type": "arguments", "id": 4}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactionable {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: i64,
}

impl Reactionable {
    pub fn argument(id: i64) -> Self {
        Self {
            kind: "arguments".to_string(),
            id,
        }
    }

    pub fn claim(id: i64) -> Self {
        Self {
            kind: "claims".to_string(),
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reaction {
    pub id: i64,
    pub reactionable_type: String,
    pub reactionable_id: i64,
    pub reaction_type: ReactionType,
    pub creator: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReaction {
    pub reactionable: Reactionable,
    pub reaction_type: ReactionType,
    pub creator: String,
}

/// Number of reactions of one type on an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, async_graphql::SimpleObject)]
pub struct ReactionsCount {
    pub reaction_type: ReactionType,
    pub count: i64,
}
