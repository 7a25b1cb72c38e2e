// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Batch jobs run by `tructl`.

pub mod campaigns;
pub mod metrics;
pub mod snowball;

use anyhow::{bail, Context};

use crate::chain::ChainQuerier;
use crate::db::Datastore;

/// Feature `claim_id` for `community_id`.
pub async fn set_claim_of_the_day(
    db: &dyn Datastore,
    chain: &dyn ChainQuerier,
    community_id: &str,
    claim_id: i64,
) -> anyhow::Result<()> {
    let claim = chain
        .claim(claim_id)
        .await
        .with_context(|| format!("looking up claim {claim_id}"))?;
    if claim.community_id != community_id {
        bail!(
            "claim {claim_id} belongs to community {}, not {community_id}",
            claim.community_id
        );
    }
    db.set_claim_of_the_day(community_id, claim_id).await?;
    tracing::info!(community_id, claim_id, "Claim of the day set");
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryChain;
    use crate::db::MemoryDatastore;

    #[tokio::test]
    async fn test_claim_of_the_day_checks_community() {
        let db = MemoryDatastore::new();
        let chain = MemoryChain::new();
        chain.add_claim(fixtures::claim(5, "crypto", "cosmos1a"));

        assert!(set_claim_of_the_day(&db, &chain, "sports", 5).await.is_err());
        assert!(set_claim_of_the_day(&db, &chain, "crypto", 9).await.is_err());

        set_claim_of_the_day(&db, &chain, "crypto", 5).await.unwrap();
        assert_eq!(db.claim_of_the_day("crypto").await.unwrap(), Some(5));
    }
}
