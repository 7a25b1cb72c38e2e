// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process chain fixture.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::types::{AppAccount, Argument, Claim, Community, Params, Stake};
use super::{ChainError, ChainQuerier, TxEvent};

#[derive(Default)]
struct State {
    claims: BTreeMap<i64, Claim>,
    arguments: BTreeMap<i64, Argument>,
    stakes: BTreeMap<i64, Stake>,
    communities: BTreeMap<String, Community>,
    accounts: BTreeMap<String, AppAccount>,
    params: Params,
    blocks: BTreeMap<i64, Vec<TxEvent>>,
    failing_blocks: BTreeMap<i64, fn() -> ChainError>,
    height: i64,
}

/// [`ChainQuerier`] over objects added by the caller.
#[derive(Default)]
pub struct MemoryChain {
    state: Mutex<State>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_claim(&self, claim: Claim) {
        self.lock().claims.insert(claim.id, claim);
    }

    pub fn add_argument(&self, argument: Argument) {
        self.lock().arguments.insert(argument.id, argument);
    }

    pub fn add_stake(&self, stake: Stake) {
        self.lock().stakes.insert(stake.id, stake);
    }

    pub fn add_community(&self, community: Community) {
        self.lock()
            .communities
            .insert(community.id.clone(), community);
    }

    pub fn set_account(&self, account: AppAccount) {
        self.lock()
            .accounts
            .insert(account.address.clone(), account);
    }

    pub fn set_params(&self, params: Params) {
        self.lock().params = params;
    }

    /// Commit a block holding `events` and return its height.
    pub fn push_block(&self, mut events: Vec<TxEvent>) -> i64 {
        let mut state = self.lock();
        state.height += 1;
        let height = state.height;
        for event in events.iter_mut() {
            event.height = height;
        }
        state.blocks.insert(height, events);
        height
    }

    /// Make `tx_events(height)` fail with the error built by `error`.
    pub fn fail_block(&self, height: i64, error: fn() -> ChainError) {
        self.lock().failing_blocks.insert(height, error);
    }
}

#[async_trait]
impl ChainQuerier for MemoryChain {
    async fn claim(&self, id: i64) -> Result<Claim, ChainError> {
        self.lock()
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("claim {id}")))
    }

    async fn claims(&self) -> Result<Vec<Claim>, ChainError> {
        Ok(self.lock().claims.values().cloned().collect())
    }

    async fn community_claims(&self, community_id: &str) -> Result<Vec<Claim>, ChainError> {
        Ok(self
            .lock()
            .claims
            .values()
            .filter(|c| c.community_id == community_id)
            .cloned()
            .collect())
    }

    async fn claims_by_creator(&self, address: &str) -> Result<Vec<Claim>, ChainError> {
        Ok(self
            .lock()
            .claims
            .values()
            .filter(|c| c.creator == address)
            .cloned()
            .collect())
    }

    async fn communities(&self) -> Result<Vec<Community>, ChainError> {
        Ok(self.lock().communities.values().cloned().collect())
    }

    async fn community(&self, id: &str) -> Result<Community, ChainError> {
        self.lock()
            .communities
            .get(id)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("community {id}")))
    }

    async fn argument(&self, id: i64) -> Result<Argument, ChainError> {
        self.lock()
            .arguments
            .get(&id)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("argument {id}")))
    }

    async fn claim_arguments(&self, claim_id: i64) -> Result<Vec<Argument>, ChainError> {
        Ok(self
            .lock()
            .arguments
            .values()
            .filter(|a| a.claim_id == claim_id)
            .cloned()
            .collect())
    }

    async fn arguments_by_creator(&self, address: &str) -> Result<Vec<Argument>, ChainError> {
        Ok(self
            .lock()
            .arguments
            .values()
            .filter(|a| a.creator == address)
            .cloned()
            .collect())
    }

    async fn argument_stakes(&self, argument_id: i64) -> Result<Vec<Stake>, ChainError> {
        Ok(self
            .lock()
            .stakes
            .values()
            .filter(|s| s.argument_id == argument_id)
            .cloned()
            .collect())
    }

    async fn stakes_by_creator(&self, address: &str) -> Result<Vec<Stake>, ChainError> {
        Ok(self
            .lock()
            .stakes
            .values()
            .filter(|s| s.creator == address)
            .cloned()
            .collect())
    }

    async fn app_account(&self, address: &str) -> Result<AppAccount, ChainError> {
        self.lock()
            .accounts
            .get(address)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("account {address}")))
    }

    async fn params(&self) -> Result<Params, ChainError> {
        Ok(self.lock().params.clone())
    }

    async fn latest_height(&self) -> Result<i64, ChainError> {
        Ok(self.lock().height)
    }

    async fn tx_events(&self, height: i64) -> Result<Vec<TxEvent>, ChainError> {
        let state = self.lock();
        if let Some(error) = state.failing_blocks.get(&height) {
            return Err(error());
        }
        Ok(state.blocks.get(&height).cloned().unwrap_or_default())
    }
}
