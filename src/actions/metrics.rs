// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily per-user, per-community metrics export.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::chain::{AppAccount, ChainError, ChainQuerier, StakeType, STAKE_DENOM};
use crate::db::Datastore;
use crate::models::{User, UserMetric};

/// Resolves argument ids to (claim id, community) with caching.
struct ArgumentIndex<'a> {
    chain: &'a dyn ChainQuerier,
    arguments: HashMap<i64, (i64, String)>,
    claims: HashMap<i64, String>,
}

impl<'a> ArgumentIndex<'a> {
    fn new(chain: &'a dyn ChainQuerier) -> Self {
        Self {
            chain,
            arguments: HashMap::new(),
            claims: HashMap::new(),
        }
    }

    async fn claim_community(&mut self, claim_id: i64) -> Result<String, ChainError> {
        if let Some(community) = self.claims.get(&claim_id) {
            return Ok(community.clone());
        }
        let community = self.chain.claim(claim_id).await?.community_id;
        self.claims.insert(claim_id, community.clone());
        Ok(community)
    }

    async fn argument_claim(&mut self, argument_id: i64) -> Result<(i64, String), ChainError> {
        if let Some(entry) = self.arguments.get(&argument_id) {
            return Ok(entry.clone());
        }
        let claim_id = self.chain.argument(argument_id).await?.claim_id;
        let community = self.claim_community(claim_id).await?;
        self.arguments
            .insert(argument_id, (claim_id, community.clone()));
        Ok((claim_id, community))
    }
}

/// Metrics of one user as of `date`, one row per community they were active in.
pub async fn user_metrics(
    chain: &dyn ChainQuerier,
    user: &User,
    date: NaiveDate,
) -> Result<Vec<UserMetric>, ChainError> {
    let mut index = ArgumentIndex::new(chain);
    let mut rows: BTreeMap<String, UserMetric> = BTreeMap::new();
    let mut backed: BTreeSet<i64> = BTreeSet::new();
    let mut challenged: BTreeSet<i64> = BTreeSet::new();

    let address = &user.address;
    for claim in chain.claims_by_creator(address).await? {
        entry(&mut rows, address, date, &claim.community_id).total_claims += 1;
    }

    for argument in chain.arguments_by_creator(address).await? {
        let community = index.claim_community(argument.claim_id).await?;
        let metric = entry(&mut rows, address, date, &community);
        metric.total_arguments += 1;
        metric.total_endorsements_received += argument.upvoted_count;
        for stake in chain.argument_stakes(argument.id).await? {
            match stake.result {
                Some(result) if result.argument_creator == *address => {
                    metric.stake_earned += result.argument_creator_reward.base_units();
                }
                _ => {}
            }
        }
    }

    for stake in chain.stakes_by_creator(address).await? {
        let (claim_id, community) = index.argument_claim(stake.argument_id).await?;
        let amount = stake.amount.base_units();
        let metric = entry(&mut rows, address, date, &community);
        match stake.stake_type {
            StakeType::Backing => {
                metric.total_amount_backed += amount;
                if backed.insert(claim_id) {
                    metric.total_claims_backed += 1;
                }
            }
            StakeType::Challenge => {
                metric.total_amount_challenged += amount;
                if challenged.insert(claim_id) {
                    metric.total_claims_challenged += 1;
                }
            }
            StakeType::Upvote => metric.total_endorsements_given += 1,
        }
        metric.total_amount_staked += amount;
        if !stake.expired {
            metric.total_amount_at_stake += amount;
        }
        if let Some(result) = &stake.result {
            let interest = result.stake_creator_reward.base_units();
            metric.interest_earned += interest;
            metric.stake_earned += interest;
            metric.stake_lost += result.slashed.base_units();
        }
    }

    let account = match chain.app_account(address).await {
        Ok(account) => account,
        Err(ChainError::NotFound(_)) => AppAccount::default(),
        Err(e) => return Err(e),
    };
    let balance = account.balance(STAKE_DENOM).base_units();
    for metric in rows.values_mut() {
        metric.stake_balance = balance;
        metric.cred_earned = account.balance(&metric.community_id).base_units();
    }

    Ok(rows.into_values().collect())
}

fn entry<'m>(
    rows: &'m mut BTreeMap<String, UserMetric>,
    address: &str,
    date: NaiveDate,
    community: &str,
) -> &'m mut UserMetric {
    rows.entry(community.to_string())
        .or_insert_with(|| UserMetric {
            address: address.to_string(),
            as_on_date: date,
            community_id: community.to_string(),
            ..UserMetric::default()
        })
}

/// Compute metrics for every user and store them in one transaction.
pub async fn export_daily_metrics(
    db: &dyn Datastore,
    chain: &dyn ChainQuerier,
    date: NaiveDate,
) -> anyhow::Result<usize> {
    let users = db.all_users().await?;
    let mut metrics = Vec::new();
    for user in &users {
        metrics.extend(user_metrics(chain, user, date).await?);
    }
    db.upsert_daily_user_metrics(&metrics).await?;
    tracing::info!(%date, users = users.len(), rows = metrics.len(), "Daily metrics exported");
    Ok(metrics.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::fixtures::{argument, claim, stake};
    use crate::chain::{Coin, MemoryChain, StakeResult};
    use crate::db::MemoryDatastore;
    use crate::models::NewUser;

    const ALICE: &str = "cosmos1xqc5gwzpg3fyv5en2fzyx36z2se5ks33tt57e7";
    const BOB: &str = "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";

    fn chain() -> MemoryChain {
        let chain = MemoryChain::new();
        chain.add_claim(claim(1, "crypto", ALICE));
        chain.add_claim(claim(2, "sports", BOB));
        chain.add_argument(argument(10, 1, ALICE, 2));
        chain.add_argument(argument(11, 2, ALICE, 0));
        chain.add_argument(argument(12, 1, BOB, 0));
        chain.add_stake(stake(100, 10, "crypto", StakeType::Backing, ALICE, 50));
        chain.add_stake(stake(101, 11, "sports", StakeType::Challenge, ALICE, 30));
        chain.add_stake(stake(102, 12, "crypto", StakeType::Upvote, ALICE, 10));

        // Alice's expired backing stake paid interest; Bob's upvote on her
        // argument paid her a share.
        let mut settled = stake(103, 10, "crypto", StakeType::Backing, ALICE, 20);
        settled.expired = true;
        settled.result = Some(StakeResult {
            stake_creator: ALICE.to_string(),
            stake_creator_reward: Coin::new(STAKE_DENOM, 4),
            ..StakeResult::default()
        });
        chain.add_stake(settled);
        let mut upvote = stake(104, 10, "crypto", StakeType::Upvote, BOB, 10);
        upvote.expired = true;
        upvote.result = Some(StakeResult {
            argument_creator: ALICE.to_string(),
            argument_creator_reward: Coin::new(STAKE_DENOM, 3),
            stake_creator: BOB.to_string(),
            stake_creator_reward: Coin::new(STAKE_DENOM, 2),
            ..StakeResult::default()
        });
        chain.add_stake(upvote);
        let mut slashed = stake(105, 11, "sports", StakeType::Challenge, ALICE, 15);
        slashed.expired = true;
        slashed.result = Some(StakeResult {
            slashed: Coin::new(STAKE_DENOM, 15),
            ..StakeResult::default()
        });
        chain.add_stake(slashed);

        chain.set_account(AppAccount {
            address: ALICE.to_string(),
            coins: vec![Coin::new(STAKE_DENOM, 900), Coin::new("crypto", 42)],
            slash_count: 0,
            is_jailed: false,
            jail_end_time: None,
        });
        chain
    }

    #[tokio::test]
    async fn test_user_metrics_per_community() {
        let db = MemoryDatastore::new();
        let alice = db
            .add_user(NewUser {
                address: ALICE.to_string(),
                username: "alice".to_string(),
                full_name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                avatar_url: String::new(),
                referred_by: None,
            })
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2019, 8, 1).unwrap();

        let rows = user_metrics(&chain(), &alice, date).await.unwrap();
        assert_eq!(rows.len(), 2);

        let crypto = &rows[0];
        assert_eq!(crypto.community_id, "crypto");
        assert_eq!(crypto.total_claims, 1);
        assert_eq!(crypto.total_arguments, 1);
        assert_eq!(crypto.total_endorsements_received, 2);
        assert_eq!(crypto.total_claims_backed, 1);
        assert_eq!(crypto.total_amount_backed, 70);
        assert_eq!(crypto.total_endorsements_given, 1);
        assert_eq!(crypto.total_amount_staked, 80);
        assert_eq!(crypto.total_amount_at_stake, 60);
        assert_eq!(crypto.interest_earned, 4);
        assert_eq!(crypto.stake_earned, 7);
        assert_eq!(crypto.stake_lost, 0);
        assert_eq!(crypto.stake_balance, 900);
        assert_eq!(crypto.cred_earned, 42);

        let sports = &rows[1];
        assert_eq!(sports.community_id, "sports");
        assert_eq!(sports.total_claims, 0);
        assert_eq!(sports.total_claims_challenged, 1);
        assert_eq!(sports.total_amount_challenged, 45);
        assert_eq!(sports.total_amount_at_stake, 30);
        assert_eq!(sports.stake_lost, 15);
        assert_eq!(sports.cred_earned, 0);
    }

    #[tokio::test]
    async fn test_export_stores_rows() {
        let db = MemoryDatastore::new();
        db.add_user(NewUser {
            address: ALICE.to_string(),
            username: "alice".to_string(),
            full_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            avatar_url: String::new(),
            referred_by: None,
        })
        .await
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2019, 8, 1).unwrap();

        let rows = export_daily_metrics(&db, &chain(), date).await.unwrap();
        assert_eq!(rows, 2);
        assert!(!db.user_metrics_empty().await.unwrap());
        let stored = db.aggregate_user_metrics(ALICE, date, date).await.unwrap();
        assert_eq!(stored.len(), 2);
    }
}
