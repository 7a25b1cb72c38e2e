// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chain objects as returned by TruChain queries.
//!
//! Amino JSON encodes 64-bit integers as strings, so integer fields accept
//! either form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::COIN_DISPLAY_NAME;

/// Base units per displayed coin.
const COIN_PRECISION: u32 = 9;

/// Denomination of stakes on TruChain.
pub const STAKE_DENOM: &str = "tru";

fn int_from_str_or_num<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int {
        Num(i64),
        Str(String),
    }
    match Int::deserialize(deserializer)? {
        Int::Num(n) => Ok(n),
        Int::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    /// Integer amount in base units, kept as a string to avoid overflow.
    pub amount: String,
}

impl Coin {
    pub fn new(denom: &str, amount: i64) -> Self {
        Self {
            denom: denom.to_string(),
            amount: amount.to_string(),
        }
    }

    /// Amount in base units; malformed amounts count as zero.
    pub fn base_units(&self) -> i64 {
        self.amount.parse().unwrap_or(0)
    }

    /// Amount in display units, e.g. `"1500000000"` becomes `"1.5"`.
    pub fn human_readable(&self) -> String {
        let amount: i128 = self.amount.parse().unwrap_or(0);
        let scale = 10i128.pow(COIN_PRECISION);
        let sign = if amount < 0 { "-" } else { "" };
        let whole = amount.abs() / scale;
        let frac = amount.abs() % scale;
        if frac == 0 {
            return format!("{sign}{whole}");
        }
        let frac = format!("{:0width$}", frac, width = COIN_PRECISION as usize);
        format!("{sign}{whole}.{}", frac.trim_end_matches('0'))
    }

    /// Human readable amount followed by the coin name.
    pub fn display(&self) -> String {
        format!("{} {}", self.human_readable(), COIN_DISPLAY_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub id: i64,
    pub community_id: String,
    pub body: String,
    pub creator: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub total_backed: Coin,
    #[serde(default)]
    pub total_challenged: Coin,
    #[serde(default, deserialize_with = "int_from_str_or_num")]
    pub total_stakers: i64,
    pub created_time: DateTime<Utc>,
}

/// Direction of a stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, async_graphql::Enum)]
#[serde(try_from = "i64", into = "i64")]
pub enum StakeType {
    Backing,
    Challenge,
    Upvote,
}

impl TryFrom<i64> for StakeType {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(StakeType::Backing),
            1 => Ok(StakeType::Challenge),
            2 => Ok(StakeType::Upvote),
            other => Err(format!("unknown stake type {other}")),
        }
    }
}

impl From<StakeType> for i64 {
    fn from(value: StakeType) -> Self {
        match value {
            StakeType::Backing => 0,
            StakeType::Challenge => 1,
            StakeType::Upvote => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub id: i64,
    pub creator: String,
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub claim_id: i64,
    pub summary: String,
    pub body: String,
    /// Backing or Challenge.
    pub stake_type: StakeType,
    #[serde(default, deserialize_with = "int_from_str_or_num")]
    pub upvoted_count: i64,
    #[serde(default)]
    pub upvoted_stake: Coin,
    #[serde(default)]
    pub total_stake: Coin,
    #[serde(default)]
    pub edited: bool,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stake {
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub id: i64,
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub argument_id: i64,
    #[serde(rename = "type")]
    pub stake_type: StakeType,
    pub amount: Coin,
    pub creator: String,
    #[serde(default)]
    pub community_id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub expired: bool,
    /// Settlement, present once the stake has expired.
    #[serde(default)]
    pub result: Option<StakeResult>,
}

/// Payouts of an expired stake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeResult {
    pub argument_creator: String,
    /// Share of an upvote paid to the argument's author.
    pub argument_creator_reward: Coin,
    pub stake_creator: String,
    /// Interest paid to the staker.
    pub stake_creator_reward: Coin,
    /// Principal forfeited because the argument was slashed.
    pub slashed: Coin,
}

/// On-chain account of an app user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppAccount {
    pub address: String,
    #[serde(default)]
    pub coins: Vec<Coin>,
    #[serde(default, deserialize_with = "int_from_str_or_num")]
    pub slash_count: i64,
    #[serde(default)]
    pub is_jailed: bool,
    #[serde(default)]
    pub jail_end_time: Option<DateTime<Utc>>,
}

impl AppAccount {
    /// Balance of `denom`, zero when the account holds none.
    pub fn balance(&self, denom: &str) -> Coin {
        self.coins
            .iter()
            .find(|c| c.denom == denom)
            .cloned()
            .unwrap_or_else(|| Coin::new(denom, 0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakingParams {
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub min_argument_length: i64,
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub max_argument_length: i64,
    pub argument_creation_stake: Coin,
    pub upvote_stake: Coin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimParams {
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub min_claim_length: i64,
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub max_claim_length: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlashingParams {
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub min_slash_count: i64,
    pub slash_magnitude: String,
}

/// Module parameters the clients need for validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub staking: StakingParams,
    pub claim: ClaimParams,
    pub slashing: SlashingParams,
}

/// Why an argument was marked Not Helpful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SlashReason {
    LogicOrEvidenceAbsent,
    IssueNotAddressed,
    FocusedOnPerson,
    Plagiarism,
    Spam,
    Other,
}

impl SlashReason {
    const ALL: [SlashReason; 6] = [
        SlashReason::LogicOrEvidenceAbsent,
        SlashReason::IssueNotAddressed,
        SlashReason::FocusedOnPerson,
        SlashReason::Plagiarism,
        SlashReason::Spam,
        SlashReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlashReason::LogicOrEvidenceAbsent => "Logic/Evidence Absent",
            SlashReason::IssueNotAddressed => "Issue Not Addressed",
            SlashReason::FocusedOnPerson => "Focused On Person",
            SlashReason::Plagiarism => "Plagiarism",
            SlashReason::Spam => "Spam",
            SlashReason::Other => "Other",
        }
    }
}

impl TryFrom<i64> for SlashReason {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| format!("unknown slash reason {value}"))
    }
}

impl From<SlashReason> for i64 {
    fn from(value: SlashReason) -> Self {
        value as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slash {
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub id: i64,
    #[serde(deserialize_with = "int_from_str_or_num")]
    pub argument_id: i64,
    pub creator: String,
    pub reason: SlashReason,
    #[serde(default)]
    pub detailed_reason: String,
    pub created_time: DateTime<Utc>,
}

impl Slash {
    /// Reason shown to the argument's author.
    pub fn reason_text(&self) -> &str {
        match self.reason {
            SlashReason::Other => &self.detailed_reason,
            reason => reason.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PunishmentType {
    StakeSlashed,
    CuratorRewarded,
    Jailed,
}

impl TryFrom<i64> for PunishmentType {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PunishmentType::StakeSlashed),
            1 => Ok(PunishmentType::CuratorRewarded),
            2 => Ok(PunishmentType::Jailed),
            other => Err(format!("unknown punishment type {other}")),
        }
    }
}

impl From<PunishmentType> for i64 {
    fn from(value: PunishmentType) -> Self {
        value as i64
    }
}

/// One consequence of a slash, carried in the `slash-results` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PunishmentResult {
    #[serde(rename = "type")]
    pub punishment_type: PunishmentType,
    pub app_account_address: String,
    #[serde(default)]
    pub coin: Coin,
}
