// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GraphQL object types.

use async_graphql::{Context, Object, Result};
use chrono::{DateTime, Utc};

use super::app_state;
use crate::chain::{
    AppAccount, Argument, ChainError, Claim, Coin, Community, Params, Stake, StakeType,
    STAKE_DENOM,
};
use crate::mentions::parse_cosmos_mentions;
use crate::models::{
    Comment, Invite, NotificationEvent, NotificationMeta, NotificationType, Reaction,
    ReactionType, Reactionable, ReactionsCount, User,
};
use crate::AppState;

/// Look up the user behind an address. Unknown addresses still resolve so
/// chain objects created outside the app can be displayed.
pub(crate) async fn user_for(state: &AppState, address: &str) -> Result<UserObject> {
    let user = state.db.user_by_address(address).await?;
    Ok(UserObject {
        address: address.to_string(),
        user,
    })
}

pub struct CoinObject(pub Coin);

#[Object(name = "Coin")]
impl CoinObject {
    async fn amount(&self) -> &str {
        &self.0.amount
    }

    async fn denom(&self) -> &str {
        &self.0.denom
    }

    /// Amount in whole coins, e.g. "1.5".
    async fn human_readable(&self) -> String {
        self.0.human_readable()
    }
}

pub struct UserObject {
    pub address: String,
    pub user: Option<User>,
}

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    async fn address(&self) -> &str {
        &self.address
    }

    async fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    async fn full_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.full_name.as_str())
    }

    async fn avatar_url(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.avatar_url.as_str())
    }

    async fn bio(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.bio.as_str())
    }

    async fn invites_left(&self) -> i32 {
        self.user.as_ref().map(|u| u.invites_left).unwrap_or(0)
    }

    async fn created_at(&self) -> Option<DateTime<Utc>> {
        self.user.as_ref().map(|u| u.created_at)
    }

    /// Stake balance; zero for addresses without an account yet.
    async fn balance(&self, ctx: &Context<'_>) -> Result<CoinObject> {
        let state = app_state(ctx)?;
        match state.chain.app_account(&self.address).await {
            Ok(account) => Ok(CoinObject(account.balance(STAKE_DENOM))),
            Err(ChainError::NotFound(_)) => Ok(CoinObject(Coin::new(STAKE_DENOM, 0))),
            Err(e) => Err(e.into()),
        }
    }

    async fn claims_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let state = app_state(ctx)?;
        Ok(state.chain.claims_by_creator(&self.address).await?.len() as i64)
    }

    async fn arguments_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let state = app_state(ctx)?;
        Ok(state.chain.arguments_by_creator(&self.address).await?.len() as i64)
    }

    async fn agrees_received(&self, ctx: &Context<'_>) -> Result<i64> {
        let state = app_state(ctx)?;
        let arguments = state.chain.arguments_by_creator(&self.address).await?;
        Ok(arguments.iter().map(|a| a.upvoted_count).sum())
    }
}

pub struct AppAccountObject(pub AppAccount);

#[Object(name = "AppAccount")]
impl AppAccountObject {
    async fn address(&self) -> &str {
        &self.0.address
    }

    async fn coins(&self) -> Vec<CoinObject> {
        self.0.coins.iter().cloned().map(CoinObject).collect()
    }

    async fn slash_count(&self) -> i64 {
        self.0.slash_count
    }

    async fn is_jailed(&self) -> bool {
        self.0.is_jailed
    }

    async fn jail_end_time(&self) -> Option<DateTime<Utc>> {
        self.0.jail_end_time
    }

    async fn user(&self, ctx: &Context<'_>) -> Result<UserObject> {
        user_for(app_state(ctx)?, &self.0.address).await
    }
}

pub struct CommunityObject(pub Community);

#[Object(name = "Community")]
impl CommunityObject {
    async fn id(&self) -> &str {
        &self.0.id
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn description(&self) -> &str {
        &self.0.description
    }

    async fn claims(&self, ctx: &Context<'_>) -> Result<Vec<ClaimObject>> {
        let state = app_state(ctx)?;
        let claims = state.chain.community_claims(&self.0.id).await?;
        Ok(claims.into_iter().map(ClaimObject).collect())
    }
}

pub struct ClaimObject(pub Claim);

impl ClaimObject {
    async fn stakes_of_type(&self, state: &AppState, kind: StakeType) -> Result<Vec<StakeObject>> {
        let mut stakes = Vec::new();
        for argument in state.chain.claim_arguments(self.0.id).await? {
            stakes.extend(
                state
                    .chain
                    .argument_stakes(argument.id)
                    .await?
                    .into_iter()
                    .filter(|s| s.stake_type == kind)
                    .map(StakeObject),
            );
        }
        Ok(stakes)
    }
}

#[Object(name = "Claim")]
impl ClaimObject {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn community_id(&self) -> &str {
        &self.0.community_id
    }

    async fn body(&self) -> &str {
        &self.0.body
    }

    async fn source(&self) -> &str {
        &self.0.source
    }

    async fn total_backed(&self) -> CoinObject {
        CoinObject(self.0.total_backed.clone())
    }

    async fn total_challenged(&self) -> CoinObject {
        CoinObject(self.0.total_challenged.clone())
    }

    async fn total_stakers(&self) -> i64 {
        self.0.total_stakers
    }

    async fn created_time(&self) -> DateTime<Utc> {
        self.0.created_time
    }

    async fn creator(&self, ctx: &Context<'_>) -> Result<UserObject> {
        user_for(app_state(ctx)?, &self.0.creator).await
    }

    async fn community(&self, ctx: &Context<'_>) -> Result<CommunityObject> {
        let state = app_state(ctx)?;
        Ok(CommunityObject(state.chain.community(&self.0.community_id).await?))
    }

    async fn arguments(&self, ctx: &Context<'_>) -> Result<Vec<ArgumentObject>> {
        let state = app_state(ctx)?;
        let arguments = state.chain.claim_arguments(self.0.id).await?;
        Ok(arguments.into_iter().map(ArgumentObject).collect())
    }

    async fn argument_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let state = app_state(ctx)?;
        Ok(state.chain.claim_arguments(self.0.id).await?.len() as i64)
    }

    async fn backings(&self, ctx: &Context<'_>) -> Result<Vec<StakeObject>> {
        self.stakes_of_type(app_state(ctx)?, StakeType::Backing).await
    }

    async fn challenges(&self, ctx: &Context<'_>) -> Result<Vec<StakeObject>> {
        self.stakes_of_type(app_state(ctx)?, StakeType::Challenge).await
    }

    /// Claim-level comments (not attached to an argument).
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<CommentObject>> {
        let state = app_state(ctx)?;
        let comments = state.db.comments_by_claim(self.0.id).await?;
        Ok(comments.into_iter().map(CommentObject).collect())
    }

    async fn flagged_by(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let state = app_state(ctx)?;
        let mut users = Vec::new();
        for address in state.db.flagged_story_addresses(self.0.id).await? {
            users.push(user_for(state, &address).await?);
        }
        Ok(users)
    }
}

pub struct ArgumentObject(pub Argument);

#[Object(name = "Argument")]
impl ArgumentObject {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn claim_id(&self) -> i64 {
        self.0.claim_id
    }

    async fn summary(&self) -> &str {
        &self.0.summary
    }

    /// Body with address mentions shown as usernames.
    async fn body(&self, ctx: &Context<'_>) -> Result<String> {
        let state = app_state(ctx)?;
        let (body, _) = parse_cosmos_mentions(state.db.as_ref(), &self.0.body).await?;
        Ok(body)
    }

    async fn stake_type(&self) -> StakeType {
        self.0.stake_type
    }

    async fn upvoted_count(&self) -> i64 {
        self.0.upvoted_count
    }

    async fn upvoted_stake(&self) -> CoinObject {
        CoinObject(self.0.upvoted_stake.clone())
    }

    async fn total_stake(&self) -> CoinObject {
        CoinObject(self.0.total_stake.clone())
    }

    async fn edited(&self) -> bool {
        self.0.edited
    }

    async fn created_time(&self) -> DateTime<Utc> {
        self.0.created_time
    }

    async fn updated_time(&self) -> DateTime<Utc> {
        self.0.updated_time
    }

    async fn creator(&self, ctx: &Context<'_>) -> Result<UserObject> {
        user_for(app_state(ctx)?, &self.0.creator).await
    }

    async fn claim(&self, ctx: &Context<'_>) -> Result<ClaimObject> {
        let state = app_state(ctx)?;
        Ok(ClaimObject(state.chain.claim(self.0.claim_id).await?))
    }

    async fn stakes(&self, ctx: &Context<'_>) -> Result<Vec<StakeObject>> {
        let state = app_state(ctx)?;
        let stakes = state.chain.argument_stakes(self.0.id).await?;
        Ok(stakes.into_iter().map(StakeObject).collect())
    }

    async fn upvotes(&self, ctx: &Context<'_>) -> Result<Vec<StakeObject>> {
        let state = app_state(ctx)?;
        let stakes = state.chain.argument_stakes(self.0.id).await?;
        Ok(stakes
            .into_iter()
            .filter(|s| s.stake_type == StakeType::Upvote)
            .map(StakeObject)
            .collect())
    }

    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<CommentObject>> {
        let state = app_state(ctx)?;
        let comments = state.db.comments_by_argument(self.0.id).await?;
        Ok(comments.into_iter().map(CommentObject).collect())
    }

    async fn reactions(&self, ctx: &Context<'_>) -> Result<Vec<ReactionObject>> {
        let state = app_state(ctx)?;
        let reactions = state
            .db
            .reactions_by_reactionable(&Reactionable::argument(self.0.id))
            .await?;
        Ok(reactions.into_iter().map(ReactionObject).collect())
    }

    async fn reactions_count(&self, ctx: &Context<'_>) -> Result<Vec<ReactionsCount>> {
        let state = app_state(ctx)?;
        Ok(state
            .db
            .reactions_count(&Reactionable::argument(self.0.id))
            .await?)
    }
}

/// A backing, challenge or upvote.
pub struct StakeObject(pub Stake);

#[Object(name = "Stake")]
impl StakeObject {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn argument_id(&self) -> i64 {
        self.0.argument_id
    }

    #[graphql(name = "type")]
    async fn stake_type(&self) -> StakeType {
        self.0.stake_type
    }

    async fn amount(&self) -> CoinObject {
        CoinObject(self.0.amount.clone())
    }

    async fn community_id(&self) -> &str {
        &self.0.community_id
    }

    async fn created_time(&self) -> DateTime<Utc> {
        self.0.created_time
    }

    async fn expired(&self) -> bool {
        self.0.expired
    }

    async fn creator(&self, ctx: &Context<'_>) -> Result<UserObject> {
        user_for(app_state(ctx)?, &self.0.creator).await
    }

    async fn argument(&self, ctx: &Context<'_>) -> Result<ArgumentObject> {
        let state = app_state(ctx)?;
        Ok(ArgumentObject(state.chain.argument(self.0.argument_id).await?))
    }
}

pub struct CommentObject(pub Comment);

#[Object(name = "Comment")]
impl CommentObject {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn parent_id(&self) -> Option<i64> {
        self.0.parent_id
    }

    async fn claim_id(&self) -> i64 {
        self.0.claim_id
    }

    async fn argument_id(&self) -> Option<i64> {
        self.0.argument_id
    }

    /// Body with address mentions shown as usernames.
    async fn body(&self, ctx: &Context<'_>) -> Result<String> {
        let state = app_state(ctx)?;
        let (body, _) = parse_cosmos_mentions(state.db.as_ref(), &self.0.body).await?;
        Ok(body)
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn creator(&self, ctx: &Context<'_>) -> Result<UserObject> {
        user_for(app_state(ctx)?, &self.0.creator).await
    }
}

pub struct ReactionObject(pub Reaction);

#[Object(name = "Reaction")]
impl ReactionObject {
    async fn id(&self) -> i64 {
        self.0.id
    }

    #[graphql(name = "type")]
    async fn reaction_type(&self) -> ReactionType {
        self.0.reaction_type
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn creator(&self, ctx: &Context<'_>) -> Result<UserObject> {
        user_for(app_state(ctx)?, &self.0.creator).await
    }
}

pub struct InviteObject(pub Invite);

#[Object(name = "Invite")]
impl InviteObject {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn friend_email(&self) -> &str {
        &self.0.friend_email
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn creator(&self, ctx: &Context<'_>) -> Result<UserObject> {
        user_for(app_state(ctx)?, &self.0.creator).await
    }
}

pub struct NotificationEventObject(pub NotificationEvent);

#[Object(name = "NotificationEvent")]
impl NotificationEventObject {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn message(&self) -> &str {
        &self.0.message
    }

    async fn type_id(&self) -> i64 {
        self.0.type_id
    }

    #[graphql(name = "type")]
    async fn notification_type(&self) -> NotificationType {
        self.0.notification_type
    }

    async fn meta(&self) -> NotificationMeta {
        self.0.meta.0.clone()
    }

    async fn read(&self) -> bool {
        self.0.read
    }

    async fn seen(&self) -> bool {
        self.0.seen
    }

    async fn timestamp(&self) -> DateTime<Utc> {
        self.0.timestamp
    }

    async fn sender(&self, ctx: &Context<'_>) -> Result<Option<UserObject>> {
        match &self.0.sender_address {
            Some(address) => Ok(Some(user_for(app_state(ctx)?, address).await?)),
            None => Ok(None),
        }
    }
}

pub struct ParamsObject(pub Params);

#[Object(name = "Params")]
impl ParamsObject {
    async fn min_argument_length(&self) -> i64 {
        self.0.staking.min_argument_length
    }

    async fn max_argument_length(&self) -> i64 {
        self.0.staking.max_argument_length
    }

    async fn argument_creation_stake(&self) -> CoinObject {
        CoinObject(self.0.staking.argument_creation_stake.clone())
    }

    async fn upvote_stake(&self) -> CoinObject {
        CoinObject(self.0.staking.upvote_stake.clone())
    }

    async fn min_claim_length(&self) -> i64 {
        self.0.claim.min_claim_length
    }

    async fn max_claim_length(&self) -> i64 {
        self.0.claim.max_claim_length
    }

    async fn min_slash_count(&self) -> i64 {
        self.0.slashing.min_slash_count
    }

    async fn slash_magnitude(&self) -> &str {
        &self.0.slashing.slash_magnitude
    }
}
