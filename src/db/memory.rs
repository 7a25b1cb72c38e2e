// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process [`Datastore`] used by tests and offline development.
//!
//! Mirrors the uniqueness rules the Postgres schema enforces.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::types::Json;

use super::{DbError, Datastore};
use crate::models::{
    Comment, DeviceToken, FlaggedStory, Invite, NewComment, NewInvite, NewNotificationEvent,
    NewReaction, NewUser, NotificationEvent, Reaction, ReactionType, Reactionable,
    ReactionsCount, TrackEvent, User, UserMetric,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    device_tokens: Vec<DeviceToken>,
    notifications: Vec<NotificationEvent>,
    comments: Vec<Comment>,
    reactions: Vec<Reaction>,
    invites: Vec<Invite>,
    flagged: Vec<FlaggedStory>,
    metrics: Vec<UserMetric>,
    claim_of_the_day: BTreeMap<String, i64>,
    track_events: Vec<TrackEvent>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Datastore holding all tables in memory.
#[derive(Default)]
pub struct MemoryDatastore {
    tables: Mutex<Tables>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock only happens in a failing test.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_address(&self, address: &str) -> Result<Option<User>, DbError> {
        Ok(self.lock().users.iter().find(|u| u.address == address).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn users_by_addresses(&self, addresses: &[String]) -> Result<Vec<User>, DbError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| addresses.contains(&u.address))
            .cloned()
            .collect())
    }

    async fn search_users_by_prefix(
        &self,
        prefix: &str,
        limit: i64,
    ) -> Result<Vec<User>, DbError> {
        let prefix = prefix.to_lowercase();
        let mut users: Vec<User> = self
            .lock()
            .users
            .iter()
            .filter(|u| u.username.to_lowercase().starts_with(&prefix))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }

    async fn add_user(&self, user: NewUser) -> Result<User, DbError> {
        let mut tables = self.lock();
        let email = user.email.to_lowercase();
        let taken = tables.users.iter().any(|u| {
            u.address == user.address
                || u.username.eq_ignore_ascii_case(&user.username)
                || u.email == email
        });
        if taken {
            return Err(DbError::Conflict(
                "address, username or email already registered".to_string(),
            ));
        }
        let id = tables.id();
        let created = User {
            id,
            address: user.address,
            username: user.username,
            full_name: user.full_name,
            email,
            avatar_url: user.avatar_url,
            bio: String::new(),
            invites_left: 0,
            referred_by: user.referred_by,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn all_users(&self) -> Result<Vec<User>, DbError> {
        Ok(self.lock().users.clone())
    }

    async fn set_invites_left(&self, user_id: i64, invites_left: i32) -> Result<(), DbError> {
        let mut tables = self.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| DbError::NotFound(format!("user {user_id}")))?;
        user.invites_left = invites_left;
        Ok(())
    }

    async fn upsert_device_token(
        &self,
        address: &str,
        token: &str,
        platform: &str,
    ) -> Result<DeviceToken, DbError> {
        let mut tables = self.lock();
        if let Some(existing) = tables.device_tokens.iter_mut().find(|t| t.token == token) {
            existing.address = address.to_string();
            existing.platform = platform.to_string();
            return Ok(existing.clone());
        }
        let id = tables.id();
        let created = DeviceToken {
            id,
            address: address.to_string(),
            token: token.to_string(),
            platform: platform.to_string(),
            created_at: Utc::now(),
        };
        tables.device_tokens.push(created.clone());
        Ok(created)
    }

    async fn remove_device_token(&self, address: &str, token: &str) -> Result<(), DbError> {
        self.lock()
            .device_tokens
            .retain(|t| !(t.address == address && t.token == token));
        Ok(())
    }

    async fn device_tokens_by_address(&self, address: &str) -> Result<Vec<DeviceToken>, DbError> {
        Ok(self
            .lock()
            .device_tokens
            .iter()
            .filter(|t| t.address == address)
            .cloned()
            .collect())
    }

    async fn add_notification_event(
        &self,
        event: NewNotificationEvent,
    ) -> Result<NotificationEvent, DbError> {
        let mut tables = self.lock();
        let id = tables.id();
        let created = NotificationEvent {
            id,
            address: event.address,
            sender_address: event.sender_address,
            message: event.message,
            type_id: event.type_id,
            notification_type: event.notification_type,
            meta: Json(event.meta),
            read: false,
            seen: false,
            timestamp: Utc::now(),
        };
        tables.notifications.push(created.clone());
        Ok(created)
    }

    async fn notification_events_by_address(
        &self,
        address: &str,
    ) -> Result<Vec<NotificationEvent>, DbError> {
        let mut events: Vec<NotificationEvent> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.address == address)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(events)
    }

    async fn mark_notification_read(
        &self,
        address: &str,
        id: Option<i64>,
    ) -> Result<u64, DbError> {
        let mut touched = 0;
        for n in self.lock().notifications.iter_mut() {
            if n.address == address && id.is_none_or(|id| n.id == id) {
                n.read = true;
                n.seen = true;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn mark_notifications_seen(&self, address: &str) -> Result<u64, DbError> {
        let mut touched = 0;
        for n in self.lock().notifications.iter_mut() {
            if n.address == address && !n.seen {
                n.seen = true;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn unseen_notifications_count(&self, address: &str) -> Result<i64, DbError> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.address == address && !n.seen)
            .count() as i64)
    }

    async fn add_comment(&self, comment: NewComment) -> Result<Comment, DbError> {
        let mut tables = self.lock();
        if let Some(parent) = comment.parent_id {
            if !tables.comments.iter().any(|c| c.id == parent) {
                return Err(DbError::NotFound(format!("parent comment {parent}")));
            }
        }
        let id = tables.id();
        let created = Comment {
            id,
            parent_id: comment.parent_id,
            claim_id: comment.claim_id,
            argument_id: comment.argument_id,
            body: comment.body,
            creator: comment.creator,
            created_at: Utc::now(),
        };
        tables.comments.push(created.clone());
        Ok(created)
    }

    async fn comments_by_claim(&self, claim_id: i64) -> Result<Vec<Comment>, DbError> {
        Ok(self
            .lock()
            .comments
            .iter()
            .filter(|c| c.claim_id == claim_id && c.argument_id.is_none())
            .cloned()
            .collect())
    }

    async fn comments_by_argument(&self, argument_id: i64) -> Result<Vec<Comment>, DbError> {
        Ok(self
            .lock()
            .comments
            .iter()
            .filter(|c| c.argument_id == Some(argument_id))
            .cloned()
            .collect())
    }

    async fn comment_participants(
        &self,
        claim_id: i64,
        argument_id: Option<i64>,
    ) -> Result<Vec<String>, DbError> {
        let mut creators: Vec<String> = self
            .lock()
            .comments
            .iter()
            .filter(|c| c.claim_id == claim_id && c.argument_id == argument_id)
            .map(|c| c.creator.clone())
            .collect();
        creators.sort();
        creators.dedup();
        Ok(creators)
    }

    async fn add_reaction(&self, reaction: NewReaction) -> Result<Reaction, DbError> {
        let mut tables = self.lock();
        let existing = tables.reactions.iter().find(|r| {
            r.reactionable_type == reaction.reactionable.kind
                && r.reactionable_id == reaction.reactionable.id
                && r.reaction_type == reaction.reaction_type
                && r.creator == reaction.creator
        });
        if let Some(existing) = existing {
            return Ok(existing.clone());
        }
        let id = tables.id();
        let created = Reaction {
            id,
            reactionable_type: reaction.reactionable.kind,
            reactionable_id: reaction.reactionable.id,
            reaction_type: reaction.reaction_type,
            creator: reaction.creator,
            created_at: Utc::now(),
        };
        tables.reactions.push(created.clone());
        Ok(created)
    }

    async fn remove_reaction(
        &self,
        creator: &str,
        target: &Reactionable,
        reaction_type: ReactionType,
    ) -> Result<(), DbError> {
        self.lock().reactions.retain(|r| {
            !(r.creator == creator
                && r.reactionable_type == target.kind
                && r.reactionable_id == target.id
                && r.reaction_type == reaction_type)
        });
        Ok(())
    }

    async fn reactions_by_reactionable(
        &self,
        target: &Reactionable,
    ) -> Result<Vec<Reaction>, DbError> {
        Ok(self
            .lock()
            .reactions
            .iter()
            .filter(|r| r.reactionable_type == target.kind && r.reactionable_id == target.id)
            .cloned()
            .collect())
    }

    async fn reactions_count(&self, target: &Reactionable) -> Result<Vec<ReactionsCount>, DbError> {
        let mut counts: BTreeMap<i32, (ReactionType, i64)> = BTreeMap::new();
        for r in self.lock().reactions.iter() {
            if r.reactionable_type == target.kind && r.reactionable_id == target.id {
                counts
                    .entry(r.reaction_type as i32)
                    .or_insert((r.reaction_type, 0))
                    .1 += 1;
            }
        }
        Ok(counts
            .into_values()
            .map(|(reaction_type, count)| ReactionsCount {
                reaction_type,
                count,
            })
            .collect())
    }

    async fn add_invite(&self, invite: NewInvite) -> Result<Option<Invite>, DbError> {
        let mut tables = self.lock();
        if tables
            .invites
            .iter()
            .any(|i| i.friend_email == invite.friend_email)
        {
            return Ok(None);
        }
        let id = tables.id();
        let created = Invite {
            id,
            creator: invite.creator,
            friend_email: invite.friend_email,
            created_at: Utc::now(),
        };
        tables.invites.push(created.clone());
        Ok(Some(created))
    }

    async fn invites(&self) -> Result<Vec<Invite>, DbError> {
        Ok(self.lock().invites.clone())
    }

    async fn invites_by_creator(&self, creator: &str) -> Result<Vec<Invite>, DbError> {
        Ok(self
            .lock()
            .invites
            .iter()
            .filter(|i| i.creator == creator)
            .cloned()
            .collect())
    }

    async fn upsert_flagged_story(
        &self,
        story_id: i64,
        creator: &str,
    ) -> Result<FlaggedStory, DbError> {
        let mut tables = self.lock();
        tables
            .flagged
            .retain(|f| !(f.story_id == story_id && f.creator == creator));
        let flagged = FlaggedStory {
            story_id,
            creator: creator.to_string(),
            created_on: Utc::now(),
        };
        tables.flagged.push(flagged.clone());
        Ok(flagged)
    }

    async fn flagged_story_addresses(&self, story_id: i64) -> Result<Vec<String>, DbError> {
        Ok(self
            .lock()
            .flagged
            .iter()
            .filter(|f| f.story_id == story_id)
            .map(|f| f.creator.clone())
            .collect())
    }

    async fn aggregate_user_metrics(
        &self,
        address: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<UserMetric>, DbError> {
        let mut grouped: BTreeMap<(NaiveDate, String), UserMetric> = BTreeMap::new();
        for m in self.lock().metrics.iter() {
            if m.address != address || m.as_on_date < from || m.as_on_date > to {
                continue;
            }
            grouped
                .entry((m.as_on_date, m.community_id.clone()))
                .or_insert_with(|| UserMetric {
                    address: m.address.clone(),
                    as_on_date: m.as_on_date,
                    community_id: m.community_id.clone(),
                    ..UserMetric::default()
                })
                .accumulate(m);
        }
        Ok(grouped.into_values().collect())
    }

    async fn upsert_daily_user_metrics(&self, metrics: &[UserMetric]) -> Result<(), DbError> {
        let mut tables = self.lock();
        for m in metrics {
            tables.metrics.retain(|existing| {
                !(existing.address == m.address
                    && existing.as_on_date == m.as_on_date
                    && existing.community_id == m.community_id)
            });
            tables.metrics.push(m.clone());
        }
        Ok(())
    }

    async fn user_metrics_empty(&self) -> Result<bool, DbError> {
        Ok(self.lock().metrics.is_empty())
    }

    async fn claim_of_the_day(&self, community_id: &str) -> Result<Option<i64>, DbError> {
        Ok(self.lock().claim_of_the_day.get(community_id).copied())
    }

    async fn set_claim_of_the_day(
        &self,
        community_id: &str,
        claim_id: i64,
    ) -> Result<(), DbError> {
        self.lock()
            .claim_of_the_day
            .insert(community_id.to_string(), claim_id);
        Ok(())
    }

    async fn add_track_event(
        &self,
        address: Option<&str>,
        session_id: Option<&str>,
        event: &str,
        claim_id: Option<i64>,
    ) -> Result<TrackEvent, DbError> {
        let mut tables = self.lock();
        let id = tables.id();
        let created = TrackEvent {
            id,
            address: address.map(str::to_string),
            session_id: session_id.map(str::to_string),
            event: event.to_string(),
            claim_id,
            created_at: Utc::now(),
        };
        tables.track_events.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(address: &str, username: &str, email: &str) -> NewUser {
        NewUser {
            address: address.to_string(),
            username: username.to_string(),
            full_name: String::new(),
            email: email.to_string(),
            avatar_url: String::new(),
            referred_by: None,
        }
    }

    #[tokio::test]
    async fn test_add_user_rejects_taken_username() {
        let db = MemoryDatastore::new();
        db.add_user(new_user("cosmos1a", "alice", "a@example.com"))
            .await
            .unwrap();
        let err = db
            .add_user(new_user("cosmos1b", "ALICE", "b@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_invite_same_email_twice_returns_none() {
        let db = MemoryDatastore::new();
        let invite = || NewInvite {
            creator: "cosmos1a".to_string(),
            friend_email: "friend@example.com".to_string(),
        };
        assert!(db.add_invite(invite()).await.unwrap().is_some());
        assert!(db.add_invite(invite()).await.unwrap().is_none());
        assert_eq!(db.invites().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reactions_are_idempotent_and_counted() {
        let db = MemoryDatastore::new();
        let like = |creator: &str| NewReaction {
            reactionable: Reactionable::argument(3),
            reaction_type: ReactionType::Like,
            creator: creator.to_string(),
        };
        let first = db.add_reaction(like("cosmos1a")).await.unwrap();
        let again = db.add_reaction(like("cosmos1a")).await.unwrap();
        assert_eq!(first.id, again.id);
        db.add_reaction(like("cosmos1b")).await.unwrap();

        let counts = db.reactions_count(&Reactionable::argument(3)).await.unwrap();
        assert_eq!(
            counts,
            vec![ReactionsCount {
                reaction_type: ReactionType::Like,
                count: 2
            }]
        );

        db.remove_reaction("cosmos1a", &Reactionable::argument(3), ReactionType::Like)
            .await
            .unwrap();
        assert_eq!(
            db.reactions_by_reactionable(&Reactionable::argument(3))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_aggregate_metrics_sums_per_day_and_community() {
        let db = MemoryDatastore::new();
        let day = NaiveDate::from_ymd_opt(2019, 7, 1).unwrap();
        let row = |community: &str, claims: i64| UserMetric {
            address: "cosmos1a".to_string(),
            as_on_date: day,
            community_id: community.to_string(),
            total_claims: claims,
            ..UserMetric::default()
        };
        db.upsert_daily_user_metrics(&[row("crypto", 2), row("sports", 1)])
            .await
            .unwrap();
        // Re-running the same day replaces rather than adds.
        db.upsert_daily_user_metrics(&[row("crypto", 3)]).await.unwrap();

        let metrics = db
            .aggregate_user_metrics("cosmos1a", day, day)
            .await
            .unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].community_id, "crypto");
        assert_eq!(metrics[0].total_claims, 3);
        assert!(!db.user_metrics_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_read_single_and_all() {
        let db = MemoryDatastore::new();
        let event = || NewNotificationEvent {
            address: "cosmos1a".to_string(),
            sender_address: None,
            message: "hi".to_string(),
            type_id: 1,
            notification_type: crate::models::NotificationType::NewArgument,
            meta: Default::default(),
        };
        let first = db.add_notification_event(event()).await.unwrap();
        db.add_notification_event(event()).await.unwrap();

        assert_eq!(db.unseen_notifications_count("cosmos1a").await.unwrap(), 2);
        assert_eq!(
            db.mark_notification_read("cosmos1a", Some(first.id))
                .await
                .unwrap(),
            1
        );
        assert_eq!(db.unseen_notifications_count("cosmos1a").await.unwrap(), 1);
        assert_eq!(db.mark_notification_read("cosmos1a", None).await.unwrap(), 2);
        assert_eq!(db.unseen_notifications_count("cosmos1a").await.unwrap(), 0);
    }
}
