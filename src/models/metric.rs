// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily per-user metrics computed by the metrics action.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One user's activity in one community on one day.
///
/// Unique on `(address, as_on_date, community_id)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserMetric {
    pub address: String,
    pub as_on_date: NaiveDate,
    pub community_id: String,
    pub total_claims: i64,
    pub total_arguments: i64,
    pub total_claims_backed: i64,
    pub total_claims_challenged: i64,
    pub total_amount_backed: i64,
    pub total_amount_challenged: i64,
    pub total_endorsements_given: i64,
    pub total_endorsements_received: i64,
    /// Interest on own stakes plus rewards received as an argument author.
    pub stake_earned: i64,
    /// Principal forfeited to slashing.
    pub stake_lost: i64,
    pub stake_balance: i64,
    pub interest_earned: i64,
    /// Stakes not yet expired.
    pub total_amount_at_stake: i64,
    /// Every stake ever made.
    pub total_amount_staked: i64,
    /// Cred held in the community.
    pub cred_earned: i64,
}

impl UserMetric {
    /// Add another row's counters into this one.
    pub fn accumulate(&mut self, other: &UserMetric) {
        self.total_claims += other.total_claims;
        self.total_arguments += other.total_arguments;
        self.total_claims_backed += other.total_claims_backed;
        self.total_claims_challenged += other.total_claims_challenged;
        self.total_amount_backed += other.total_amount_backed;
        self.total_amount_challenged += other.total_amount_challenged;
        self.total_endorsements_given += other.total_endorsements_given;
        self.total_endorsements_received += other.total_endorsements_received;
        self.stake_earned += other.stake_earned;
        self.stake_lost += other.stake_lost;
        self.stake_balance += other.stake_balance;
        self.interest_earned += other.interest_earned;
        self.total_amount_at_stake += other.total_amount_at_stake;
        self.total_amount_staked += other.total_amount_staked;
        self.cred_earned += other.cred_earned;
    }
}
