// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GraphQL schema over chain objects and off-chain records.
//!
//! Resolvers read [`AppState`] and the optional [`AuthUser`] from the
//! request data; the HTTP handler attaches both per request.

pub mod mutation;
pub mod objects;
pub mod query;

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, Schema};

use crate::middleware::AuthUser;
use crate::AppState;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema() -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish()
}

pub(crate) fn app_state<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Arc<AppState>> {
    ctx.data::<Arc<AppState>>()
}

pub(crate) fn session_user<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a AuthUser> {
    ctx.data_opt::<AuthUser>()
        .ok_or_else(|| async_graphql::Error::new("Authentication required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_exposes_root_fields() {
        let sdl = build_schema().sdl();
        for field in [
            "claim(",
            "claims(",
            "communities",
            "claimArguments(",
            "appAccount(",
            "notifications",
            "claimOfTheDay(",
            "addComment(",
        ] {
            assert!(sdl.contains(field), "missing {field}");
        }
        assert!(sdl.contains("type Claim"));
        assert!(sdl.contains("humanReadable"));
    }
}
