// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_graphql::{Context, Object, Result};

use super::objects::{
    user_for, AppAccountObject, ArgumentObject, ClaimObject, CommentObject, CommunityObject,
    InviteObject, NotificationEventObject, ParamsObject, UserObject,
};
use super::{app_state, session_user};

/// Default and maximum page size for `claims`.
const DEFAULT_PAGE_SIZE: i32 = 20;
const MAX_PAGE_SIZE: i32 = 100;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn claim(&self, ctx: &Context<'_>, id: i64) -> Result<ClaimObject> {
        let state = app_state(ctx)?;
        Ok(ClaimObject(state.chain.claim(id).await?))
    }

    /// Newest claims first. `after` is the id of the last claim of the
    /// previous page.
    async fn claims(
        &self,
        ctx: &Context<'_>,
        community_id: Option<String>,
        first: Option<i32>,
        after: Option<i64>,
    ) -> Result<Vec<ClaimObject>> {
        let state = app_state(ctx)?;
        let mut claims = match community_id.as_deref() {
            Some(id) if !id.is_empty() && id != "all" => state.chain.community_claims(id).await?,
            _ => state.chain.claims().await?,
        };
        claims.sort_by(|a, b| b.id.cmp(&a.id));
        let first = first.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE) as usize;
        Ok(claims
            .into_iter()
            .filter(|c| after.is_none_or(|after| c.id < after))
            .take(first)
            .map(ClaimObject)
            .collect())
    }

    async fn communities(&self, ctx: &Context<'_>) -> Result<Vec<CommunityObject>> {
        let state = app_state(ctx)?;
        let communities = state.chain.communities().await?;
        Ok(communities.into_iter().map(CommunityObject).collect())
    }

    async fn community(&self, ctx: &Context<'_>, id: String) -> Result<CommunityObject> {
        let state = app_state(ctx)?;
        Ok(CommunityObject(state.chain.community(&id).await?))
    }

    async fn argument(&self, ctx: &Context<'_>, id: i64) -> Result<ArgumentObject> {
        let state = app_state(ctx)?;
        Ok(ArgumentObject(state.chain.argument(id).await?))
    }

    async fn claim_arguments(
        &self,
        ctx: &Context<'_>,
        claim_id: i64,
    ) -> Result<Vec<ArgumentObject>> {
        let state = app_state(ctx)?;
        let arguments = state.chain.claim_arguments(claim_id).await?;
        Ok(arguments.into_iter().map(ArgumentObject).collect())
    }

    async fn app_account(&self, ctx: &Context<'_>, id: String) -> Result<AppAccountObject> {
        let state = app_state(ctx)?;
        Ok(AppAccountObject(state.chain.app_account(&id).await?))
    }

    /// Registered users among `addresses`.
    async fn users(&self, ctx: &Context<'_>, addresses: Vec<String>) -> Result<Vec<UserObject>> {
        let state = app_state(ctx)?;
        let users = state.db.users_by_addresses(&addresses).await?;
        Ok(users
            .into_iter()
            .map(|u| UserObject {
                address: u.address.clone(),
                user: Some(u),
            })
            .collect())
    }

    /// Argument thread when `argument_id` is set, claim-level thread otherwise.
    async fn comments(
        &self,
        ctx: &Context<'_>,
        claim_id: i64,
        argument_id: Option<i64>,
    ) -> Result<Vec<CommentObject>> {
        let state = app_state(ctx)?;
        let comments = match argument_id {
            Some(argument_id) => state.db.comments_by_argument(argument_id).await?,
            None => state.db.comments_by_claim(claim_id).await?,
        };
        Ok(comments.into_iter().map(CommentObject).collect())
    }

    /// Invites sent by the session user.
    async fn invites(&self, ctx: &Context<'_>) -> Result<Vec<InviteObject>> {
        let state = app_state(ctx)?;
        let user = session_user(ctx)?;
        let invites = state.db.invites_by_creator(&user.address).await?;
        Ok(invites.into_iter().map(InviteObject).collect())
    }

    /// Notification feed of the session user, newest first.
    async fn notifications(&self, ctx: &Context<'_>) -> Result<Vec<NotificationEventObject>> {
        let state = app_state(ctx)?;
        let user = session_user(ctx)?;
        let events = state.db.notification_events_by_address(&user.address).await?;
        Ok(events.into_iter().map(NotificationEventObject).collect())
    }

    async fn unseen_notifications_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let state = app_state(ctx)?;
        let user = session_user(ctx)?;
        Ok(state.db.unseen_notifications_count(&user.address).await?)
    }

    /// The session user.
    async fn me(&self, ctx: &Context<'_>) -> Result<UserObject> {
        let state = app_state(ctx)?;
        let user = session_user(ctx)?;
        user_for(state, &user.address).await
    }

    async fn params(&self, ctx: &Context<'_>) -> Result<ParamsObject> {
        let state = app_state(ctx)?;
        Ok(ParamsObject(state.chain.params().await?))
    }

    async fn claim_of_the_day(
        &self,
        ctx: &Context<'_>,
        community_id: String,
    ) -> Result<Option<ClaimObject>> {
        let state = app_state(ctx)?;
        match state.db.claim_of_the_day(&community_id).await? {
            Some(id) => Ok(Some(ClaimObject(state.chain.claim(id).await?))),
            None => Ok(None),
        }
    }
}
