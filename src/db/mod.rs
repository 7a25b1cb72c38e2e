// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers talk to the [`Datastore`] trait. [`PgDatastore`] is the
//! Postgres implementation; [`MemoryDatastore`] keeps everything in process
//! for tests and offline development.

pub mod memory;
pub mod postgres;

pub use memory::MemoryDatastore;
pub use postgres::PgDatastore;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{
    Comment, DeviceToken, FlaggedStory, Invite, NewComment, NewInvite, NewNotificationEvent,
    NewReaction, NewUser, NotificationEvent, Reaction, ReactionType, Reactionable,
    ReactionsCount, TrackEvent, User, UserMetric,
};

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const DEVICE_TOKENS: &str = "device_tokens";
    pub const NOTIFICATION_EVENTS: &str = "notification_events";
    pub const COMMENTS: &str = "comments";
    pub const REACTIONS: &str = "reactions";
    pub const INVITES: &str = "invites";
    pub const FLAGGED_STORIES: &str = "flagged_stories";
    pub const USER_METRICS: &str = "user_metrics";
    pub const CLAIM_OF_THE_DAY: &str = "claim_of_the_day_ids";
    pub const TRACK_EVENTS: &str = "track_events";
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A unique constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Off-chain persistence used by every service.
#[async_trait]
pub trait Datastore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, DbError>;
    async fn user_by_address(&self, address: &str) -> Result<Option<User>, DbError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, DbError>;
    async fn users_by_addresses(&self, addresses: &[String]) -> Result<Vec<User>, DbError>;
    /// Case-insensitive username prefix search, ordered by username.
    async fn search_users_by_prefix(&self, prefix: &str, limit: i64)
        -> Result<Vec<User>, DbError>;
    /// Fails with [`DbError::Conflict`] when address, username or email is taken.
    async fn add_user(&self, user: NewUser) -> Result<User, DbError>;
    async fn all_users(&self) -> Result<Vec<User>, DbError>;
    async fn set_invites_left(&self, user_id: i64, invites_left: i32) -> Result<(), DbError>;

    // ─── Device tokens ───────────────────────────────────────────

    /// Register a token; a token moves to the latest address that claims it.
    async fn upsert_device_token(
        &self,
        address: &str,
        token: &str,
        platform: &str,
    ) -> Result<DeviceToken, DbError>;
    async fn remove_device_token(&self, address: &str, token: &str) -> Result<(), DbError>;
    async fn device_tokens_by_address(&self, address: &str) -> Result<Vec<DeviceToken>, DbError>;

    // ─── Notifications ───────────────────────────────────────────

    async fn add_notification_event(
        &self,
        event: NewNotificationEvent,
    ) -> Result<NotificationEvent, DbError>;
    /// Newest first.
    async fn notification_events_by_address(
        &self,
        address: &str,
    ) -> Result<Vec<NotificationEvent>, DbError>;
    /// Mark one notification (or all when `id` is `None`) as read.
    /// Returns the number of rows touched.
    async fn mark_notification_read(&self, address: &str, id: Option<i64>)
        -> Result<u64, DbError>;
    async fn mark_notifications_seen(&self, address: &str) -> Result<u64, DbError>;
    async fn unseen_notifications_count(&self, address: &str) -> Result<i64, DbError>;

    // ─── Comments ────────────────────────────────────────────────

    async fn add_comment(&self, comment: NewComment) -> Result<Comment, DbError>;
    async fn comments_by_claim(&self, claim_id: i64) -> Result<Vec<Comment>, DbError>;
    async fn comments_by_argument(&self, argument_id: i64) -> Result<Vec<Comment>, DbError>;
    /// Distinct creators of comments in the thread (argument thread when
    /// `argument_id` is set, claim-level thread otherwise).
    async fn comment_participants(
        &self,
        claim_id: i64,
        argument_id: Option<i64>,
    ) -> Result<Vec<String>, DbError>;

    // ─── Reactions ───────────────────────────────────────────────

    /// Idempotent per (target, type, creator).
    async fn add_reaction(&self, reaction: NewReaction) -> Result<Reaction, DbError>;
    async fn remove_reaction(
        &self,
        creator: &str,
        target: &Reactionable,
        reaction_type: ReactionType,
    ) -> Result<(), DbError>;
    async fn reactions_by_reactionable(
        &self,
        target: &Reactionable,
    ) -> Result<Vec<Reaction>, DbError>;
    async fn reactions_count(&self, target: &Reactionable) -> Result<Vec<ReactionsCount>, DbError>;

    // ─── Invites ─────────────────────────────────────────────────

    /// Returns `None` when the email has already been invited.
    async fn add_invite(&self, invite: NewInvite) -> Result<Option<Invite>, DbError>;
    async fn invites(&self) -> Result<Vec<Invite>, DbError>;
    async fn invites_by_creator(&self, creator: &str) -> Result<Vec<Invite>, DbError>;

    // ─── Flagging ────────────────────────────────────────────────

    async fn upsert_flagged_story(
        &self,
        story_id: i64,
        creator: &str,
    ) -> Result<FlaggedStory, DbError>;
    async fn flagged_story_addresses(&self, story_id: i64) -> Result<Vec<String>, DbError>;

    // ─── Metrics ─────────────────────────────────────────────────

    /// Sum an address's metrics per (date, community) within `[from, to]`,
    /// ordered by date then community.
    async fn aggregate_user_metrics(
        &self,
        address: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UserMetric>, DbError>;
    /// Insert or replace daily rows, all or nothing.
    async fn upsert_daily_user_metrics(&self, metrics: &[UserMetric]) -> Result<(), DbError>;
    async fn user_metrics_empty(&self) -> Result<bool, DbError>;

    // ─── Claim of the day ────────────────────────────────────────

    async fn claim_of_the_day(&self, community_id: &str) -> Result<Option<i64>, DbError>;
    async fn set_claim_of_the_day(&self, community_id: &str, claim_id: i64)
        -> Result<(), DbError>;

    // ─── Tracking ────────────────────────────────────────────────

    async fn add_track_event(
        &self,
        address: Option<&str>,
        session_id: Option<&str>,
        event: &str,
        claim_id: Option<i64>,
    ) -> Result<TrackEvent, DbError>;
}
