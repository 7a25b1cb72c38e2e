// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres implementation of [`Datastore`] on top of sqlx.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;

use super::{DbError, Datastore};
use crate::config::DatabaseConfig;
use crate::models::{
    Comment, DeviceToken, FlaggedStory, Invite, NewComment, NewInvite, NewNotificationEvent,
    NewReaction, NewUser, NotificationEvent, Reaction, ReactionType, Reactionable,
    ReactionsCount, TrackEvent, User, UserMetric,
};

/// Schema migrations, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const USER_COLUMNS: &str = "id, address, username, full_name, email, avatar_url, bio, \
                            invites_left, referred_by, created_at";

/// Postgres-backed datastore.
#[derive(Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

/// Turn a unique-constraint violation into [`DbError::Conflict`].
fn conflict(err: sqlx::Error, what: &str) -> DbError {
    let is_unique = err
        .as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false);
    if is_unique {
        DbError::Conflict(what.to_string())
    } else {
        DbError::Sqlx(err)
    }
}

/// Map a foreign key violation to `NotFound` for the referenced row.
fn missing_reference(err: sqlx::Error, what: &str) -> DbError {
    let is_fk = err
        .as_database_error()
        .map(|e| e.is_foreign_key_violation())
        .unwrap_or(false);
    if is_fk {
        DbError::NotFound(what.to_string())
    } else {
        DbError::Sqlx(err)
    }
}

/// Escape LIKE wildcards in user input.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl PgDatastore {
    /// Connect a pool to the configured database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.url())
            .await?;

        tracing::info!(host = %config.host, db = %config.name, "Connected to Postgres");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply all pending migrations.
    pub async fn migrate_up(&self) -> Result<(), DbError> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Revert migrations newer than `target`.
    pub async fn migrate_down(&self, target: i64) -> Result<(), DbError> {
        MIGRATOR.undo(&self.pool, target).await?;
        Ok(())
    }
}

#[async_trait]
impl Datastore for PgDatastore {
    // ─── Users ───────────────────────────────────────────────────

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_address(&self, address: &str) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE address = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(address)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1)");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn users_by_addresses(&self, addresses: &[String]) -> Result<Vec<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE address = ANY($1)");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(addresses)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn search_users_by_prefix(
        &self,
        prefix: &str,
        limit: i64,
    ) -> Result<Vec<User>, DbError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username ILIKE $1 || '%' ESCAPE '\\' \
             ORDER BY username LIMIT $2"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(escape_like(prefix))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn add_user(&self, user: NewUser) -> Result<User, DbError> {
        let sql = format!(
            "INSERT INTO users (address, username, full_name, email, avatar_url, referred_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.address)
            .bind(&user.username)
            .bind(&user.full_name)
            .bind(user.email.to_lowercase())
            .bind(&user.avatar_url)
            .bind(&user.referred_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict(e, "address, username or email already registered"))
    }

    async fn all_users(&self) -> Result<Vec<User>, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn set_invites_left(&self, user_id: i64, invites_left: i32) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE users SET invites_left = $2 WHERE id = $1")
            .bind(user_id)
            .bind(invites_left)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    // ─── Device tokens ───────────────────────────────────────────

    async fn upsert_device_token(
        &self,
        address: &str,
        token: &str,
        platform: &str,
    ) -> Result<DeviceToken, DbError> {
        Ok(sqlx::query_as::<_, DeviceToken>(
            "INSERT INTO device_tokens (address, token, platform) VALUES ($1, $2, $3) \
             ON CONFLICT (token) DO UPDATE SET address = EXCLUDED.address, \
             platform = EXCLUDED.platform \
             RETURNING id, address, token, platform, created_at",
        )
        .bind(address)
        .bind(token)
        .bind(platform)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn remove_device_token(&self, address: &str, token: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM device_tokens WHERE address = $1 AND token = $2")
            .bind(address)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn device_tokens_by_address(&self, address: &str) -> Result<Vec<DeviceToken>, DbError> {
        Ok(sqlx::query_as::<_, DeviceToken>(
            "SELECT id, address, token, platform, created_at FROM device_tokens \
             WHERE address = $1 ORDER BY id",
        )
        .bind(address)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Notifications ───────────────────────────────────────────

    async fn add_notification_event(
        &self,
        event: NewNotificationEvent,
    ) -> Result<NotificationEvent, DbError> {
        Ok(sqlx::query_as::<_, NotificationEvent>(
            "INSERT INTO notification_events (address, sender_address, message, type_id, type, meta) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, address, sender_address, message, type_id, type, meta, read, seen, timestamp",
        )
        .bind(&event.address)
        .bind(&event.sender_address)
        .bind(&event.message)
        .bind(event.type_id)
        .bind(event.notification_type)
        .bind(Json(&event.meta))
        .fetch_one(&self.pool)
        .await?)
    }

    async fn notification_events_by_address(
        &self,
        address: &str,
    ) -> Result<Vec<NotificationEvent>, DbError> {
        Ok(sqlx::query_as::<_, NotificationEvent>(
            "SELECT id, address, sender_address, message, type_id, type, meta, read, seen, timestamp \
             FROM notification_events WHERE address = $1 ORDER BY timestamp DESC, id DESC",
        )
        .bind(address)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn mark_notification_read(
        &self,
        address: &str,
        id: Option<i64>,
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE notification_events SET read = TRUE, seen = TRUE \
             WHERE address = $1 AND ($2::BIGINT IS NULL OR id = $2)",
        )
        .bind(address)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn mark_notifications_seen(&self, address: &str) -> Result<u64, DbError> {
        let result = sqlx::query(
            "UPDATE notification_events SET seen = TRUE WHERE address = $1 AND seen = FALSE",
        )
        .bind(address)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn unseen_notifications_count(&self, address: &str) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_events WHERE address = $1 AND seen = FALSE",
        )
        .bind(address)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // ─── Comments ────────────────────────────────────────────────

    async fn add_comment(&self, comment: NewComment) -> Result<Comment, DbError> {
        let parent = comment.parent_id;
        sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (parent_id, claim_id, argument_id, body, creator) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, parent_id, claim_id, argument_id, body, creator, created_at",
        )
        .bind(comment.parent_id)
        .bind(comment.claim_id)
        .bind(comment.argument_id)
        .bind(&comment.body)
        .bind(&comment.creator)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            missing_reference(e, &format!("parent comment {}", parent.unwrap_or_default()))
        })
    }

    async fn comments_by_claim(&self, claim_id: i64) -> Result<Vec<Comment>, DbError> {
        Ok(sqlx::query_as::<_, Comment>(
            "SELECT id, parent_id, claim_id, argument_id, body, creator, created_at \
             FROM comments WHERE claim_id = $1 AND argument_id IS NULL ORDER BY id",
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn comments_by_argument(&self, argument_id: i64) -> Result<Vec<Comment>, DbError> {
        Ok(sqlx::query_as::<_, Comment>(
            "SELECT id, parent_id, claim_id, argument_id, body, creator, created_at \
             FROM comments WHERE argument_id = $1 ORDER BY id",
        )
        .bind(argument_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn comment_participants(
        &self,
        claim_id: i64,
        argument_id: Option<i64>,
    ) -> Result<Vec<String>, DbError> {
        Ok(sqlx::query_scalar(
            "SELECT DISTINCT creator FROM comments WHERE claim_id = $1 \
             AND argument_id IS NOT DISTINCT FROM $2 ORDER BY creator",
        )
        .bind(claim_id)
        .bind(argument_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Reactions ───────────────────────────────────────────────

    async fn add_reaction(&self, reaction: NewReaction) -> Result<Reaction, DbError> {
        Ok(sqlx::query_as::<_, Reaction>(
            "INSERT INTO reactions (reactionable_type, reactionable_id, reaction_type, creator) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT no_duplicate_reaction \
             DO UPDATE SET creator = EXCLUDED.creator \
             RETURNING id, reactionable_type, reactionable_id, reaction_type, creator, created_at",
        )
        .bind(&reaction.reactionable.kind)
        .bind(reaction.reactionable.id)
        .bind(reaction.reaction_type)
        .bind(&reaction.creator)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn remove_reaction(
        &self,
        creator: &str,
        target: &Reactionable,
        reaction_type: ReactionType,
    ) -> Result<(), DbError> {
        sqlx::query(
            "DELETE FROM reactions WHERE creator = $1 AND reactionable_type = $2 \
             AND reactionable_id = $3 AND reaction_type = $4",
        )
        .bind(creator)
        .bind(&target.kind)
        .bind(target.id)
        .bind(reaction_type)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reactions_by_reactionable(
        &self,
        target: &Reactionable,
    ) -> Result<Vec<Reaction>, DbError> {
        Ok(sqlx::query_as::<_, Reaction>(
            "SELECT id, reactionable_type, reactionable_id, reaction_type, creator, created_at \
             FROM reactions WHERE reactionable_type = $1 AND reactionable_id = $2 ORDER BY id",
        )
        .bind(&target.kind)
        .bind(target.id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn reactions_count(&self, target: &Reactionable) -> Result<Vec<ReactionsCount>, DbError> {
        Ok(sqlx::query_as::<_, ReactionsCount>(
            "SELECT reaction_type, COUNT(*) AS count FROM reactions \
             WHERE reactionable_type = $1 AND reactionable_id = $2 \
             GROUP BY reaction_type ORDER BY reaction_type",
        )
        .bind(&target.kind)
        .bind(target.id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Invites ─────────────────────────────────────────────────

    async fn add_invite(&self, invite: NewInvite) -> Result<Option<Invite>, DbError> {
        Ok(sqlx::query_as::<_, Invite>(
            "INSERT INTO invites (creator, friend_email) VALUES ($1, $2) \
             ON CONFLICT (friend_email) DO NOTHING \
             RETURNING id, creator, friend_email, created_at",
        )
        .bind(&invite.creator)
        .bind(&invite.friend_email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn invites(&self) -> Result<Vec<Invite>, DbError> {
        Ok(sqlx::query_as::<_, Invite>(
            "SELECT id, creator, friend_email, created_at FROM invites ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn invites_by_creator(&self, creator: &str) -> Result<Vec<Invite>, DbError> {
        Ok(sqlx::query_as::<_, Invite>(
            "SELECT id, creator, friend_email, created_at FROM invites \
             WHERE creator = $1 ORDER BY id",
        )
        .bind(creator)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Flagging ────────────────────────────────────────────────

    async fn upsert_flagged_story(
        &self,
        story_id: i64,
        creator: &str,
    ) -> Result<FlaggedStory, DbError> {
        Ok(sqlx::query_as::<_, FlaggedStory>(
            "INSERT INTO flagged_stories (story_id, creator) VALUES ($1, $2) \
             ON CONFLICT (story_id, creator) DO UPDATE SET created_on = NOW() \
             RETURNING story_id, creator, created_on",
        )
        .bind(story_id)
        .bind(creator)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn flagged_story_addresses(&self, story_id: i64) -> Result<Vec<String>, DbError> {
        Ok(sqlx::query_scalar(
            "SELECT creator FROM flagged_stories WHERE story_id = $1 ORDER BY created_on",
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await?)
    }

    // ─── Metrics ─────────────────────────────────────────────────

    async fn aggregate_user_metrics(
        &self,
        address: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UserMetric>, DbError> {
        Ok(sqlx::query_as::<_, UserMetric>(
            "SELECT address, as_on_date, community_id, \
                SUM(total_claims)::BIGINT AS total_claims, \
                SUM(total_arguments)::BIGINT AS total_arguments, \
                SUM(total_claims_backed)::BIGINT AS total_claims_backed, \
                SUM(total_claims_challenged)::BIGINT AS total_claims_challenged, \
                SUM(total_amount_backed)::BIGINT AS total_amount_backed, \
                SUM(total_amount_challenged)::BIGINT AS total_amount_challenged, \
                SUM(total_endorsements_given)::BIGINT AS total_endorsements_given, \
                SUM(total_endorsements_received)::BIGINT AS total_endorsements_received, \
                SUM(stake_earned)::BIGINT AS stake_earned, \
                SUM(stake_lost)::BIGINT AS stake_lost, \
                SUM(stake_balance)::BIGINT AS stake_balance, \
                SUM(interest_earned)::BIGINT AS interest_earned, \
                SUM(total_amount_at_stake)::BIGINT AS total_amount_at_stake, \
                SUM(total_amount_staked)::BIGINT AS total_amount_staked, \
                SUM(cred_earned)::BIGINT AS cred_earned \
             FROM user_metrics \
             WHERE address = $1 AND as_on_date >= $2 AND as_on_date <= $3 \
             GROUP BY address, as_on_date, community_id \
             ORDER BY as_on_date, community_id",
        )
        .bind(address)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn upsert_daily_user_metrics(&self, metrics: &[UserMetric]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for m in metrics {
            sqlx::query(
                "INSERT INTO user_metrics (address, as_on_date, community_id, total_claims, \
                    total_arguments, total_claims_backed, total_claims_challenged, \
                    total_amount_backed, total_amount_challenged, total_endorsements_given, \
                    total_endorsements_received, stake_earned, stake_lost, stake_balance, \
                    interest_earned, total_amount_at_stake, total_amount_staked, cred_earned) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                    $16, $17, $18) \
                 ON CONFLICT ON CONSTRAINT no_duplicate_metric DO UPDATE SET \
                    total_claims = EXCLUDED.total_claims, \
                    total_arguments = EXCLUDED.total_arguments, \
                    total_claims_backed = EXCLUDED.total_claims_backed, \
                    total_claims_challenged = EXCLUDED.total_claims_challenged, \
                    total_amount_backed = EXCLUDED.total_amount_backed, \
                    total_amount_challenged = EXCLUDED.total_amount_challenged, \
                    total_endorsements_given = EXCLUDED.total_endorsements_given, \
                    total_endorsements_received = EXCLUDED.total_endorsements_received, \
                    stake_earned = EXCLUDED.stake_earned, \
                    stake_lost = EXCLUDED.stake_lost, \
                    stake_balance = EXCLUDED.stake_balance, \
                    interest_earned = EXCLUDED.interest_earned, \
                    total_amount_at_stake = EXCLUDED.total_amount_at_stake, \
                    total_amount_staked = EXCLUDED.total_amount_staked, \
                    cred_earned = EXCLUDED.cred_earned",
            )
            .bind(&m.address)
            .bind(m.as_on_date)
            .bind(&m.community_id)
            .bind(m.total_claims)
            .bind(m.total_arguments)
            .bind(m.total_claims_backed)
            .bind(m.total_claims_challenged)
            .bind(m.total_amount_backed)
            .bind(m.total_amount_challenged)
            .bind(m.total_endorsements_given)
            .bind(m.total_endorsements_received)
            .bind(m.stake_earned)
            .bind(m.stake_lost)
            .bind(m.stake_balance)
            .bind(m.interest_earned)
            .bind(m.total_amount_at_stake)
            .bind(m.total_amount_staked)
            .bind(m.cred_earned)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn user_metrics_empty(&self) -> Result<bool, DbError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM user_metrics)")
            .fetch_one(&self.pool)
            .await?;
        Ok(!exists)
    }

    // ─── Claim of the day ────────────────────────────────────────

    async fn claim_of_the_day(&self, community_id: &str) -> Result<Option<i64>, DbError> {
        Ok(sqlx::query_scalar(
            "SELECT claim_id FROM claim_of_the_day_ids WHERE community_id = $1",
        )
        .bind(community_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_claim_of_the_day(
        &self,
        community_id: &str,
        claim_id: i64,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO claim_of_the_day_ids (community_id, claim_id) VALUES ($1, $2) \
             ON CONFLICT (community_id) DO UPDATE SET claim_id = EXCLUDED.claim_id",
        )
        .bind(community_id)
        .bind(claim_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ─── Tracking ────────────────────────────────────────────────

    async fn add_track_event(
        &self,
        address: Option<&str>,
        session_id: Option<&str>,
        event: &str,
        claim_id: Option<i64>,
    ) -> Result<TrackEvent, DbError> {
        Ok(sqlx::query_as::<_, TrackEvent>(
            "INSERT INTO track_events (address, session_id, event, claim_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, address, session_id, event, claim_id, created_at",
        )
        .bind(address)
        .bind(session_id)
        .bind(event)
        .bind(claim_id)
        .fetch_one(&self.pool)
        .await?)
    }
}
