// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Referral "snowball": hand out invites to active users who ran out.

use crate::chain::ChainQuerier;
use crate::db::Datastore;

/// Give `invites` invites to every user with none left and at least
/// `min_arguments` arguments. Returns the addresses that got invites.
pub async fn grant_invites(
    db: &dyn Datastore,
    chain: &dyn ChainQuerier,
    invites: i32,
    min_arguments: usize,
) -> anyhow::Result<Vec<String>> {
    let mut granted = Vec::new();
    for user in db.all_users().await? {
        if user.invites_left > 0 {
            continue;
        }
        let arguments = chain.arguments_by_creator(&user.address).await?.len();
        if arguments < min_arguments {
            tracing::debug!(address = %user.address, arguments, "Not enough arguments for invites");
            continue;
        }
        db.set_invites_left(user.id, invites).await?;
        tracing::info!(address = %user.address, invites, "Invites granted");
        granted.push(user.address);
    }
    Ok(granted)
}
