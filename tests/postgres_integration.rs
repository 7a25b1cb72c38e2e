// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres datastore tests.
//!
//! Run against a scratch database:
//!   DATABASE_URL=postgres://postgres@localhost/trudb_test cargo test --test postgres_integration

mod common;

use chrono::NaiveDate;
use common::{ALICE, BOB};
use octopus::db::{Datastore, DbError, PgDatastore};
use octopus::models::{
    NewComment, NewInvite, NewNotificationEvent, NewReaction, NewUser, NotificationMeta,
    NotificationType, ReactionType, Reactionable, UserMetric,
};
use sqlx::postgres::PgPoolOptions;

async fn fresh_store(url: &str) -> PgDatastore {
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(url)
        .await
        .expect("connect to DATABASE_URL");
    let db = PgDatastore::from_pool(pool);
    db.migrate_down(0).await.expect("migrate down");
    db.migrate_up().await.expect("migrate up");
    db
}

fn new_user(address: &str, username: &str) -> NewUser {
    NewUser {
        address: address.to_string(),
        username: username.to_string(),
        full_name: username.to_string(),
        email: format!("{username}@example.com"),
        avatar_url: String::new(),
        referred_by: None,
    }
}

/// One test so the shared database is never migrated concurrently.
#[tokio::test]
async fn test_postgres_datastore() {
    let url = require_database!();
    let db = fresh_store(&url).await;

    users(&db).await;
    invites_are_unique_per_email(&db).await;
    comment_participants(&db).await;
    comment_with_missing_parent(&db).await;
    notifications_read_and_seen(&db).await;
    reactions_are_idempotent(&db).await;
    metrics_upsert_and_aggregate(&db).await;
}

async fn users(db: &PgDatastore) {
    let alice = db.add_user(new_user(ALICE, "alice")).await.unwrap();
    assert_eq!(alice.invites_left, 0);
    let err = db.add_user(new_user(BOB, "Alice")).await.unwrap_err();
    assert!(matches!(err, DbError::Conflict(_)), "{err:?}");

    db.set_invites_left(alice.id, 5).await.unwrap();
    let found = db.user_by_username("ALICE").await.unwrap().unwrap();
    assert_eq!(found.invites_left, 5);
}

async fn invites_are_unique_per_email(db: &PgDatastore) {
    let invite = NewInvite {
        creator: ALICE.to_string(),
        friend_email: "friend@example.com".to_string(),
    };
    assert!(db.add_invite(invite.clone()).await.unwrap().is_some());
    assert!(db.add_invite(invite).await.unwrap().is_none());
}

async fn comment_participants(db: &PgDatastore) {
    for (creator, argument_id) in [(ALICE, Some(4)), (BOB, Some(4)), (BOB, None)] {
        db.add_comment(NewComment {
            parent_id: None,
            claim_id: 1,
            argument_id,
            body: "hi".to_string(),
            creator: creator.to_string(),
        })
        .await
        .unwrap();
    }

    let mut on_argument = db.comment_participants(1, Some(4)).await.unwrap();
    on_argument.sort();
    assert_eq!(on_argument, vec![ALICE.to_string(), BOB.to_string()]);
    assert_eq!(db.comment_participants(1, None).await.unwrap(), vec![BOB.to_string()]);
}

async fn comment_with_missing_parent(db: &PgDatastore) {
    let err = db
        .add_comment(NewComment {
            parent_id: Some(999),
            claim_id: 1,
            argument_id: None,
            body: "reply".to_string(),
            creator: ALICE.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound(_)), "{err:?}");
}

async fn notifications_read_and_seen(db: &PgDatastore) {
    let mut ids = Vec::new();
    for type_id in [1, 2, 3] {
        let event = db
            .add_notification_event(NewNotificationEvent {
                address: BOB.to_string(),
                sender_address: Some(ALICE.to_string()),
                message: "alice added a new argument".to_string(),
                type_id,
                notification_type: NotificationType::NewArgument,
                meta: NotificationMeta {
                    claim_id: Some(1),
                    ..NotificationMeta::default()
                },
            })
            .await
            .unwrap();
        ids.push(event.id);
    }
    assert_eq!(db.unseen_notifications_count(BOB).await.unwrap(), 3);

    assert_eq!(db.mark_notification_read(BOB, Some(ids[0])).await.unwrap(), 1);
    assert_eq!(db.mark_notification_read(ALICE, Some(ids[1])).await.unwrap(), 0);
    assert_eq!(db.unseen_notifications_count(BOB).await.unwrap(), 2);

    assert_eq!(db.mark_notifications_seen(BOB).await.unwrap(), 2);
    assert_eq!(db.mark_notifications_seen(BOB).await.unwrap(), 0);

    let events = db.notification_events_by_address(BOB).await.unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.seen));
    let read: Vec<i64> = events.iter().filter(|e| e.read).map(|e| e.id).collect();
    assert_eq!(read, vec![ids[0]]);
    assert_eq!(events[0].meta.0.claim_id, Some(1));
}

async fn reactions_are_idempotent(db: &PgDatastore) {
    let target = Reactionable::argument(4);
    let like = |creator: &str| NewReaction {
        reactionable: target.clone(),
        reaction_type: ReactionType::Like,
        creator: creator.to_string(),
    };
    let first = db.add_reaction(like(ALICE)).await.unwrap();
    let again = db.add_reaction(like(ALICE)).await.unwrap();
    assert_eq!(first.id, again.id);
    db.add_reaction(like(BOB)).await.unwrap();

    let counts = db.reactions_count(&target).await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].count, 2);

    db.remove_reaction(ALICE, &target, ReactionType::Like)
        .await
        .unwrap();
    assert_eq!(db.reactions_by_reactionable(&target).await.unwrap().len(), 1);
}

async fn metrics_upsert_and_aggregate(db: &PgDatastore) {
    assert!(db.user_metrics_empty().await.unwrap());
    let day = NaiveDate::from_ymd_opt(2019, 8, 1).unwrap();
    let row = |community: &str, claims: i64, earned: i64| UserMetric {
        address: ALICE.to_string(),
        as_on_date: day,
        community_id: community.to_string(),
        total_claims: claims,
        stake_earned: earned,
        interest_earned: earned,
        total_amount_at_stake: 10,
        cred_earned: 5,
        ..UserMetric::default()
    };

    db.upsert_daily_user_metrics(&[row("crypto", 2, 1), row("sports", 1, 0)])
        .await
        .unwrap();
    // Re-export of the same day replaces the row.
    db.upsert_daily_user_metrics(&[row("crypto", 3, 4)])
        .await
        .unwrap();
    assert!(!db.user_metrics_empty().await.unwrap());

    let metrics = db.aggregate_user_metrics(ALICE, day, day).await.unwrap();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0], row("crypto", 3, 4));
    assert_eq!(metrics[1], row("sports", 1, 0));

    let next = day.succ_opt().unwrap();
    assert!(db
        .aggregate_user_metrics(ALICE, next, next)
        .await
        .unwrap()
        .is_empty());
}
