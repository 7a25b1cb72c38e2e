// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chain access.
//!
//! Everything that reads TruChain state goes through [`ChainQuerier`].
//! [`ChainClient`] talks to a Tendermint node over RPC; [`MemoryChain`]
//! serves fixtures for tests and offline runs.

pub mod client;
pub mod events;
pub mod memory;
pub mod types;

pub use client::ChainClient;
pub use events::TxEvent;
pub use memory::MemoryChain;
pub use types::{
    AppAccount, Argument, Claim, ClaimParams, Coin, Community, Params, PunishmentResult,
    PunishmentType, Slash, SlashReason, SlashingParams, Stake, StakeResult, StakeType,
    StakingParams, STAKE_DENOM,
};

use async_trait::async_trait;

/// Errors from chain queries.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The ABCI application rejected the query.
    #[error("Query failed with code {code}: {log}")]
    Query { code: u32, log: String },

    #[error("RPC request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Read-only view of chain state.
#[async_trait]
pub trait ChainQuerier: Send + Sync {
    async fn claim(&self, id: i64) -> Result<Claim, ChainError>;
    async fn claims(&self) -> Result<Vec<Claim>, ChainError>;
    async fn community_claims(&self, community_id: &str) -> Result<Vec<Claim>, ChainError>;
    async fn claims_by_creator(&self, address: &str) -> Result<Vec<Claim>, ChainError>;

    async fn communities(&self) -> Result<Vec<Community>, ChainError>;
    async fn community(&self, id: &str) -> Result<Community, ChainError>;

    async fn argument(&self, id: i64) -> Result<Argument, ChainError>;
    async fn claim_arguments(&self, claim_id: i64) -> Result<Vec<Argument>, ChainError>;
    async fn arguments_by_creator(&self, address: &str) -> Result<Vec<Argument>, ChainError>;

    async fn argument_stakes(&self, argument_id: i64) -> Result<Vec<Stake>, ChainError>;
    async fn stakes_by_creator(&self, address: &str) -> Result<Vec<Stake>, ChainError>;

    async fn app_account(&self, address: &str) -> Result<AppAccount, ChainError>;
    async fn params(&self) -> Result<Params, ChainError>;

    /// Height of the most recent committed block.
    async fn latest_height(&self) -> Result<i64, ChainError>;
    /// Events of the successful transactions in a block.
    async fn tx_events(&self, height: i64) -> Result<Vec<TxEvent>, ChainError>;
}

/// Distinct addresses that wrote or staked on an argument of a claim.
pub async fn claim_participants(
    chain: &dyn ChainQuerier,
    claim_id: i64,
) -> Result<Vec<String>, ChainError> {
    let mut participants = Vec::new();
    for argument in chain.claim_arguments(claim_id).await? {
        participants.push(argument.creator.clone());
        for stake in chain.argument_stakes(argument.id).await? {
            participants.push(stake.creator);
        }
    }
    participants.sort();
    participants.dedup();
    Ok(participants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn argument(id: i64, claim_id: i64, creator: &str) -> Argument {
        Argument {
            id,
            creator: creator.to_string(),
            claim_id,
            summary: String::new(),
            body: String::new(),
            stake_type: StakeType::Backing,
            upvoted_count: 0,
            upvoted_stake: Coin::default(),
            total_stake: Coin::default(),
            edited: false,
            created_time: Utc::now(),
            updated_time: Utc::now(),
        }
    }

    fn upvote(id: i64, argument_id: i64, creator: &str) -> Stake {
        Stake {
            id,
            argument_id,
            stake_type: StakeType::Upvote,
            amount: Coin::new(types::STAKE_DENOM, 10),
            creator: creator.to_string(),
            community_id: String::new(),
            created_time: Utc::now(),
            expired: false,
            result: None,
        }
    }

    #[tokio::test]
    async fn test_claim_participants_are_distinct() {
        let chain = MemoryChain::new();
        chain.add_argument(argument(1, 7, "cosmos1a"));
        chain.add_argument(argument(2, 7, "cosmos1b"));
        chain.add_argument(argument(3, 8, "cosmos1z"));
        chain.add_stake(upvote(1, 1, "cosmos1b"));
        chain.add_stake(upvote(2, 2, "cosmos1c"));

        let participants = claim_participants(&chain, 7).await.unwrap();
        assert_eq!(participants, vec!["cosmos1a", "cosmos1b", "cosmos1c"]);
    }
}
