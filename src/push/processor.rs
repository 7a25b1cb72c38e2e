// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Turns chain events and comment requests into notifications.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::{CommentNotificationRequest, Notification, PushError};
use crate::chain::{
    claim_participants, Argument, ChainQuerier, PunishmentResult, PunishmentType, Slash, Stake,
    TxEvent,
};
use crate::config::COIN_DISPLAY_NAME;
use crate::db::Datastore;
use crate::mentions::parse_cosmos_mentions;
use crate::models::{MentionType, NotificationMeta, NotificationType};

pub const ACTION_CREATE_ARGUMENT: &str = "create-argument";
pub const ACTION_CREATE_UPVOTE: &str = "create-upvote";
pub const ACTION_CREATE_SLASH: &str = "create-slash";

const SLASH_RESULTS_ATTRIBUTE: &str = "slash-results";
const MIN_SLASH_COUNT_ATTRIBUTE: &str = "min-slash-count";

/// Decides who hears about what.
pub struct EventProcessor {
    db: Arc<dyn Datastore>,
    chain: Arc<dyn ChainQuerier>,
    tx: mpsc::Sender<Notification>,
}

impl EventProcessor {
    pub fn new(
        db: Arc<dyn Datastore>,
        chain: Arc<dyn ChainQuerier>,
        tx: mpsc::Sender<Notification>,
    ) -> Self {
        Self { db, chain, tx }
    }

    async fn emit(&self, notification: Notification) {
        tracing::debug!(
            to = %notification.to,
            kind = ?notification.notification_type,
            type_id = notification.type_id,
            "Queueing notification"
        );
        if self.tx.send(notification).await.is_err() {
            tracing::error!("Notification channel closed");
        }
    }

    /// Dispatch a transaction event on its action. Unknown actions are ignored.
    pub async fn process_tx_event(&self, event: &TxEvent) {
        let result = match event.action.as_str() {
            ACTION_CREATE_ARGUMENT => self.process_argument_created(event).await,
            ACTION_CREATE_UPVOTE => self.process_upvote(event).await,
            ACTION_CREATE_SLASH => self.process_slash(event).await,
            _ => Ok(()),
        };
        if let Err(e) = result {
            tracing::error!(
                height = event.height,
                action = %event.action,
                error = %e,
                "Failed to process tx event"
            );
        }
    }

    async fn process_argument_created(&self, event: &TxEvent) -> Result<(), PushError> {
        let argument: Argument = event.decode_data()?;
        let claim = self.chain.claim(argument.claim_id).await?;
        let participants = claim_participants(self.chain.as_ref(), claim.id).await?;

        let author = argument.creator.clone();
        let meta = NotificationMeta {
            claim_id: Some(claim.id),
            argument_id: Some(argument.id),
            ..NotificationMeta::default()
        };
        let mut notified: HashSet<String> = HashSet::new();
        notified.insert(author.clone());

        let (_, mentioned) = parse_cosmos_mentions(self.db.as_ref(), &argument.body).await?;
        let mention_type = MentionType::Argument;
        for address in mentioned {
            if !notified.insert(address.clone()) {
                continue;
            }
            self.emit(Notification {
                from: Some(author.clone()),
                to: address,
                msg: format!("mentioned you {}: {}", mention_type.phrase(), argument.summary),
                type_id: argument.id,
                notification_type: NotificationType::MentionAction,
                meta: NotificationMeta {
                    mention_type: Some(mention_type),
                    ..meta.clone()
                },
                action: "Mentioned you in an argument".to_string(),
                trim: true,
            })
            .await;
        }

        if notified.insert(claim.creator.clone()) {
            self.emit(Notification {
                from: Some(author.clone()),
                to: claim.creator.clone(),
                msg: format!(
                    "added a new argument on a claim you created: {}",
                    argument.summary
                ),
                type_id: argument.id,
                notification_type: NotificationType::NewArgument,
                meta: meta.clone(),
                action: "New Argument".to_string(),
                trim: false,
            })
            .await;
        }

        for participant in participants {
            if !notified.insert(participant.clone()) {
                continue;
            }
            self.emit(Notification {
                from: Some(author.clone()),
                to: participant,
                msg: format!(
                    "added a new argument on a claim you participated in: {}",
                    argument.summary
                ),
                type_id: argument.id,
                notification_type: NotificationType::NewArgument,
                meta: meta.clone(),
                action: "New Argument".to_string(),
                trim: false,
            })
            .await;
        }
        Ok(())
    }

    async fn process_upvote(&self, event: &TxEvent) -> Result<(), PushError> {
        let stake: Stake = event.decode_data()?;
        let argument = self.chain.argument(stake.argument_id).await?;

        self.emit(Notification {
            from: Some(stake.creator),
            to: argument.creator,
            msg: format!("agreed with your argument: {}", argument.summary),
            type_id: argument.id,
            notification_type: NotificationType::AgreeReceived,
            meta: NotificationMeta {
                claim_id: Some(argument.claim_id),
                argument_id: Some(argument.id),
                ..NotificationMeta::default()
            },
            action: "Agree Received".to_string(),
            trim: false,
        })
        .await;
        Ok(())
    }

    async fn process_slash(&self, event: &TxEvent) -> Result<(), PushError> {
        let slash: Slash = event.decode_data()?;
        let argument = self.chain.argument(slash.argument_id).await?;
        let meta = NotificationMeta {
            claim_id: Some(argument.claim_id),
            argument_id: Some(argument.id),
            ..NotificationMeta::default()
        };

        self.emit(Notification {
            from: None,
            to: argument.creator.clone(),
            msg: format!(
                "Someone marked your argument as **Not Helpful** because: **{}**",
                slash.reason_text()
            ),
            type_id: argument.id,
            notification_type: NotificationType::NotHelpful,
            meta: meta.clone(),
            action: "Not Helpful received on an Argument".to_string(),
            trim: false,
        })
        .await;

        let Some(raw_results) = event.attribute(SLASH_RESULTS_ATTRIBUTE) else {
            return Ok(());
        };
        let min_count = event.attribute(MIN_SLASH_COUNT_ATTRIBUTE).unwrap_or_default();
        match serde_json::from_str::<Vec<PunishmentResult>>(raw_results) {
            Ok(results) => {
                self.notify_slashes(&results, &meta, argument.id, min_count)
                    .await
            }
            Err(e) => tracing::warn!(error = %e, "Failed to decode punishment results"),
        }
        Ok(())
    }

    /// Tell punished stakers, rewarded curators and jailed accounts.
    pub async fn notify_slashes(
        &self,
        results: &[PunishmentResult],
        meta: &NotificationMeta,
        argument_id: i64,
        min_count: &str,
    ) {
        let slashed: BTreeSet<&str> = results
            .iter()
            .filter(|r| r.punishment_type != PunishmentType::CuratorRewarded)
            .map(|r| r.app_account_address.as_str())
            .collect();

        for address in slashed {
            self.emit(Notification {
                from: None,
                to: address.to_string(),
                msg: format!(
                    "You've been penalized! You've either wrote an argument that has been marked Not Helpful {min_count} times or Agreed with an argument marked as Not Helpful {min_count} times."
                ),
                type_id: argument_id,
                notification_type: NotificationType::Slashed,
                meta: meta.clone(),
                action: "Slashed".to_string(),
                trim: false,
            })
            .await;
        }

        for result in results {
            match result.punishment_type {
                PunishmentType::CuratorRewarded => {
                    self.emit(Notification {
                        from: None,
                        to: result.app_account_address.clone(),
                        msg: format!(
                            "You just earned {} {} from an argument you marked as Not Helpful",
                            result.coin.human_readable(),
                            COIN_DISPLAY_NAME
                        ),
                        type_id: argument_id,
                        notification_type: NotificationType::EarnedStake,
                        meta: meta.clone(),
                        action: format!("Earned {COIN_DISPLAY_NAME}"),
                        trim: false,
                    })
                    .await;
                }
                PunishmentType::Jailed => {
                    self.emit(Notification {
                        from: None,
                        to: result.app_account_address.clone(),
                        msg: "You've been slashed too many times and sent to jail. Basic privileges will be stripped.".to_string(),
                        type_id: argument_id,
                        notification_type: NotificationType::Jailed,
                        meta: meta.clone(),
                        action: "Jailed".to_string(),
                        trim: false,
                    })
                    .await;
                }
                PunishmentType::StakeSlashed => {}
            }
        }
    }

    /// Notify mentioned users and earlier commenters about a new comment.
    pub async fn process_comment_notification(
        &self,
        request: CommentNotificationRequest,
    ) -> Result<(), PushError> {
        let (body, mentioned) = parse_cosmos_mentions(self.db.as_ref(), &request.body).await?;
        let meta = NotificationMeta {
            claim_id: Some(request.claim_id),
            argument_id: request.argument_id,
            comment_id: Some(request.id),
            mention_type: None,
        };

        let mut notified: HashSet<String> = HashSet::new();
        notified.insert(request.creator.clone());

        let mention_type = MentionType::Comment;
        for address in mentioned {
            if !notified.insert(address.clone()) {
                continue;
            }
            self.emit(Notification {
                from: Some(request.creator.clone()),
                to: address,
                msg: format!("mentioned you {}: {}", mention_type.phrase(), body),
                type_id: request.id,
                notification_type: NotificationType::MentionAction,
                meta: NotificationMeta {
                    mention_type: Some(mention_type),
                    ..meta.clone()
                },
                action: "Mentioned you in a comment".to_string(),
                trim: true,
            })
            .await;
        }

        let participants = self
            .db
            .comment_participants(request.claim_id, request.argument_id)
            .await?;
        for participant in participants {
            if !notified.insert(participant.clone()) {
                continue;
            }
            self.emit(Notification {
                from: Some(request.creator.clone()),
                to: participant,
                msg: format!("added a comment: {body}"),
                type_id: request.id,
                notification_type: NotificationType::CommentAction,
                meta: meta.clone(),
                action: "New Comment".to_string(),
                trim: true,
            })
            .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Claim, Coin, MemoryChain, StakeType};
    use crate::db::MemoryDatastore;
    use crate::models::NewComment;
    use chrono::Utc;

    const CLAIM_CREATOR: &str = "cosmos1claimcreator";
    const AUTHOR: &str = "cosmos1author";
    const MENTIONED: &str = "cosmos1xqc5gwzpg3fyv5en2fzyx36z2se5ks33tt57e7";

    fn claim() -> Claim {
        Claim {
            id: 1,
            community_id: "crypto".to_string(),
            body: "Bitcoin is digital gold".to_string(),
            creator: CLAIM_CREATOR.to_string(),
            source: String::new(),
            total_backed: Coin::default(),
            total_challenged: Coin::default(),
            total_stakers: 0,
            created_time: Utc::now(),
        }
    }

    fn argument(id: i64, creator: &str, body: &str) -> Argument {
        Argument {
            id,
            creator: creator.to_string(),
            claim_id: 1,
            summary: format!("summary {id}"),
            body: body.to_string(),
            stake_type: StakeType::Backing,
            upvoted_count: 0,
            upvoted_stake: Coin::default(),
            total_stake: Coin::default(),
            edited: false,
            created_time: Utc::now(),
            updated_time: Utc::now(),
        }
    }

    fn event(action: &str, data: serde_json::Value) -> TxEvent {
        TxEvent {
            height: 1,
            action: action.to_string(),
            data: serde_json::to_vec(&data).unwrap(),
            attributes: Vec::new(),
        }
    }

    fn setup() -> (EventProcessor, Arc<MemoryChain>, Arc<MemoryDatastore>, mpsc::Receiver<Notification>) {
        let chain = Arc::new(MemoryChain::new());
        let db = Arc::new(MemoryDatastore::new());
        let (tx, rx) = mpsc::channel(64);
        let processor = EventProcessor::new(db.clone(), chain.clone(), tx);
        (processor, chain, db, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<Notification>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    #[tokio::test]
    async fn test_argument_created_notifies_mentions_creator_then_participants() {
        let (processor, chain, _db, mut rx) = setup();
        chain.add_claim(claim());
        chain.add_argument(argument(1, "cosmos1earlier", "first"));
        let new_argument = argument(2, AUTHOR, &format!("cc @{MENTIONED} and @{MENTIONED}"));
        chain.add_argument(new_argument.clone());

        processor
            .process_tx_event(&event(
                ACTION_CREATE_ARGUMENT,
                serde_json::to_value(&new_argument).unwrap(),
            ))
            .await;

        let sent = drain(&mut rx);
        let recipients: Vec<&str> = sent.iter().map(|n| n.to.as_str()).collect();
        assert_eq!(recipients, vec![MENTIONED, CLAIM_CREATOR, "cosmos1earlier"]);

        assert_eq!(sent[0].notification_type, NotificationType::MentionAction);
        assert_eq!(sent[0].meta.mention_type, Some(MentionType::Argument));
        assert!(sent[0].trim);
        assert_eq!(
            sent[1].msg,
            "added a new argument on a claim you created: summary 2"
        );
        assert_eq!(
            sent[2].msg,
            "added a new argument on a claim you participated in: summary 2"
        );
        assert!(sent.iter().all(|n| n.from.as_deref() == Some(AUTHOR)));
        assert!(sent.iter().all(|n| n.meta.claim_id == Some(1)));
    }

    #[tokio::test]
    async fn test_argument_by_claim_creator_skips_self() {
        let (processor, chain, _db, mut rx) = setup();
        chain.add_claim(claim());
        let own = argument(3, CLAIM_CREATOR, "no mentions");
        chain.add_argument(own.clone());

        processor
            .process_tx_event(&event(ACTION_CREATE_ARGUMENT, serde_json::to_value(&own).unwrap()))
            .await;

        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_upvote_notifies_argument_creator() {
        let (processor, chain, _db, mut rx) = setup();
        chain.add_argument(argument(4, AUTHOR, "body"));

        processor
            .process_tx_event(&event(
                ACTION_CREATE_UPVOTE,
                serde_json::json!({
                    "id": 9,
                    "argument_id": 4,
                    "type": 2,
                    "amount": {"denom": "tru", "amount": "10"},
                    "creator": "cosmos1fan",
                    "created_time": "2019-08-01T10:00:00Z"
                }),
            ))
            .await;

        let sent = drain(&mut rx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, AUTHOR);
        assert_eq!(sent[0].from.as_deref(), Some("cosmos1fan"));
        assert_eq!(sent[0].msg, "agreed with your argument: summary 4");
        assert_eq!(sent[0].notification_type, NotificationType::AgreeReceived);
    }

    #[tokio::test]
    async fn test_slash_with_punishments() {
        let (processor, chain, _db, mut rx) = setup();
        chain.add_argument(argument(5, AUTHOR, "body"));

        let mut slash_event = event(
            ACTION_CREATE_SLASH,
            serde_json::json!({
                "id": 1,
                "argument_id": 5,
                "creator": "cosmos1curator",
                "reason": 5,
                "detailed_reason": "off topic",
                "created_time": "2019-08-01T10:00:00Z"
            }),
        );
        let results = serde_json::json!([
            {"type": 0, "app_account_address": AUTHOR, "coin": {"denom": "tru", "amount": "5"}},
            {"type": 0, "app_account_address": "cosmos1upvoter", "coin": {"denom": "tru", "amount": "5"}},
            {"type": 1, "app_account_address": "cosmos1curator", "coin": {"denom": "tru", "amount": "2500000000"}},
            {"type": 2, "app_account_address": AUTHOR}
        ]);
        slash_event.attributes = vec![
            (SLASH_RESULTS_ATTRIBUTE.to_string(), results.to_string()),
            (MIN_SLASH_COUNT_ATTRIBUTE.to_string(), "3".to_string()),
        ];

        processor.process_tx_event(&slash_event).await;
        let sent = drain(&mut rx);

        assert_eq!(sent[0].notification_type, NotificationType::NotHelpful);
        assert!(sent[0].msg.contains("**off topic**"));

        let slashed: Vec<&str> = sent
            .iter()
            .filter(|n| n.notification_type == NotificationType::Slashed)
            .map(|n| n.to.as_str())
            .collect();
        assert_eq!(slashed, vec![AUTHOR, "cosmos1upvoter"]);
        assert!(sent[1].msg.contains("Not Helpful 3 times"));

        let earned: Vec<&Notification> = sent
            .iter()
            .filter(|n| n.notification_type == NotificationType::EarnedStake)
            .collect();
        assert_eq!(earned.len(), 1);
        assert_eq!(
            earned[0].msg,
            "You just earned 2.5 TRU from an argument you marked as Not Helpful"
        );

        let jailed = sent
            .iter()
            .filter(|n| n.notification_type == NotificationType::Jailed)
            .count();
        assert_eq!(jailed, 1);
    }

    #[tokio::test]
    async fn test_unknown_action_is_ignored() {
        let (processor, _chain, _db, mut rx) = setup();
        processor
            .process_tx_event(&event("send", serde_json::json!({})))
            .await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_comment_notifies_previous_commenters_once() {
        let (processor, _chain, db, mut rx) = setup();
        for creator in ["cosmos1first", "cosmos1second", "cosmos1first", AUTHOR] {
            db.add_comment(NewComment {
                parent_id: None,
                claim_id: 1,
                argument_id: None,
                body: "earlier".to_string(),
                creator: creator.to_string(),
            })
            .await
            .unwrap();
        }

        processor
            .process_comment_notification(CommentNotificationRequest {
                id: 99,
                claim_id: 1,
                argument_id: None,
                creator: AUTHOR.to_string(),
                body: format!("hey @{MENTIONED}"),
                timestamp: Utc::now(),
            })
            .await
            .unwrap();

        let sent = drain(&mut rx);
        let recipients: Vec<&str> = sent.iter().map(|n| n.to.as_str()).collect();
        assert_eq!(recipients, vec![MENTIONED, "cosmos1first", "cosmos1second"]);
        assert_eq!(sent[0].meta.mention_type, Some(MentionType::Comment));
        assert_eq!(sent[1].notification_type, NotificationType::CommentAction);
        assert_eq!(sent[1].meta.comment_id, Some(99));
    }
}
