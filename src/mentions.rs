// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `@mention` handling.
//!
//! Bodies are stored on chain with `@cosmos1…` addresses and shown to users
//! with `@username`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::db::{Datastore, DbError};

static ADDRESS_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(cosmos1[a-z0-9]{38})\b").expect("valid address regex"));

static USERNAME_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("valid username regex"));

static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cosmos1[a-z0-9]{38}$").expect("valid address regex"));

/// Whether `s` is a whole chain address.
pub fn is_address(s: &str) -> bool {
    ADDRESS.is_match(s)
}

/// Distinct mentioned addresses in order of first appearance.
pub fn extract_addresses(body: &str) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::new();
    for caps in ADDRESS_MENTION.captures_iter(body) {
        let address = &caps[1];
        if !addresses.iter().any(|a| a == address) {
            addresses.push(address.to_string());
        }
    }
    addresses
}

/// Replace `@address` with `@username` where a username is known.
pub fn replace_addresses(body: &str, usernames: &HashMap<String, String>) -> String {
    ADDRESS_MENTION
        .replace_all(body, |caps: &Captures| match usernames.get(&caps[1]) {
            Some(username) => format!("@{username}"),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Rewrite address mentions to usernames and return the mentioned addresses.
pub async fn parse_cosmos_mentions(
    db: &dyn Datastore,
    body: &str,
) -> Result<(String, Vec<String>), DbError> {
    let addresses = extract_addresses(body);
    if addresses.is_empty() {
        return Ok((body.to_string(), addresses));
    }
    let usernames: HashMap<String, String> = db
        .users_by_addresses(&addresses)
        .await?
        .into_iter()
        .map(|u| (u.address, u.username))
        .collect();
    Ok((replace_addresses(body, &usernames), addresses))
}

/// Rewrite `@username` mentions to `@address` for users that exist.
pub async fn translate_to_cosmos(db: &dyn Datastore, body: &str) -> Result<String, DbError> {
    let mut addresses = HashMap::new();
    for caps in USERNAME_MENTION.captures_iter(body) {
        let username = caps[1].to_string();
        if username.starts_with("cosmos1") || addresses.contains_key(&username) {
            continue;
        }
        if let Some(user) = db.user_by_username(&username).await? {
            addresses.insert(username, user.address);
        }
    }
    Ok(USERNAME_MENTION
        .replace_all(body, |caps: &Captures| match addresses.get(&caps[1]) {
            Some(address) => format!("@{address}"),
            None => caps[0].to_string(),
        })
        .into_owned())
}
