// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User-generated content: comments, reactions, invites and flags.

use crate::error::{AppError, Result};
use crate::mentions::translate_to_cosmos;
use crate::middleware::AuthUser;
use crate::models::{
    Comment, FlaggedStory, Invite, NewComment, NewInvite, NewReaction, Reaction, ReactionType,
    Reactionable,
};
use crate::push::CommentNotificationRequest;
use crate::routes::SuccessResponse;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::ValidateEmail;

/// Things that can be reacted to.
const REACTIONABLE_TYPES: &[&str] = &["claims", "arguments", "comments"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/flagStory", post(flag_story))
        .route("/comments", post(add_comment))
        .route("/reactions", post(add_reaction).delete(remove_reaction))
        .route("/mentions/translateToCosmos", post(translate_mentions))
        .route("/invite", post(create_invite).fallback(not_found))
}

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

async fn not_found() -> AppError {
    AppError::NotFound("resource not found".to_string())
}

// ─── Flagging ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FlagStoryRequest {
    pub story_id: i64,
}

async fn flag_story(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    request: JsonBody<FlagStoryRequest>,
) -> Result<Json<FlaggedStory>> {
    let Json(request) = request?;
    let user = user.ok_or(AppError::Unauthorized)?;

    let flagged = state
        .db
        .upsert_flagged_story(request.story_id, &user.address)
        .await?;
    tracing::info!(story_id = request.story_id, address = %user.address, "Story flagged");
    Ok(Json(flagged))
}

// ─── Comments ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentRequest {
    pub parent_id: Option<i64>,
    pub claim_id: i64,
    pub argument_id: Option<i64>,
    pub body: String,
}

/// Store a comment from `creator` and queue its notifications.
///
/// `@username` mentions are stored as addresses.
pub async fn create_comment(
    state: &AppState,
    creator: &str,
    request: AddCommentRequest,
) -> Result<Comment> {
    let body = request.body.trim();
    if body.is_empty() {
        return Err(AppError::BadRequest("comment body is empty".to_string()));
    }

    match request.argument_id {
        Some(argument_id) => {
            let argument = state.chain.argument(argument_id).await?;
            if argument.claim_id != request.claim_id {
                return Err(AppError::BadRequest(format!(
                    "argument {argument_id} is not on claim {}",
                    request.claim_id
                )));
            }
        }
        None => {
            state.chain.claim(request.claim_id).await?;
        }
    }

    let body = translate_to_cosmos(state.db.as_ref(), body).await?;
    let comment = state
        .db
        .add_comment(NewComment {
            parent_id: request.parent_id,
            claim_id: request.claim_id,
            argument_id: request.argument_id,
            body,
            creator: creator.to_string(),
        })
        .await?;

    tracing::info!(
        comment_id = comment.id,
        claim_id = comment.claim_id,
        argument_id = ?comment.argument_id,
        "Comment added"
    );

    state
        .comment_notifications
        .notify(CommentNotificationRequest {
            id: comment.id,
            claim_id: comment.claim_id,
            argument_id: comment.argument_id,
            creator: comment.creator.clone(),
            body: comment.body.clone(),
            timestamp: comment.created_at,
        });

    Ok(comment)
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    request: JsonBody<AddCommentRequest>,
) -> Result<Json<Comment>> {
    let Json(request) = request?;
    Ok(Json(create_comment(&state, &user.address, request).await?))
}

// ─── Reactions ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub reactionable: Reactionable,
    pub reaction_type: ReactionType,
}

impl ReactionRequest {
    fn check(&self) -> Result<()> {
        if REACTIONABLE_TYPES.contains(&self.reactionable.kind.as_str()) {
            Ok(())
        } else {
            Err(AppError::BadRequest(format!(
                "cannot react to {}",
                self.reactionable.kind
            )))
        }
    }
}

async fn add_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    request: JsonBody<ReactionRequest>,
) -> Result<Json<Reaction>> {
    let Json(request) = request?;
    request.check()?;
    let reaction = state
        .db
        .add_reaction(NewReaction {
            reactionable: request.reactionable,
            reaction_type: request.reaction_type,
            creator: user.address,
        })
        .await?;
    Ok(Json(reaction))
}

async fn remove_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    request: JsonBody<ReactionRequest>,
) -> Result<Json<SuccessResponse>> {
    let Json(request) = request?;
    request.check()?;
    state
        .db
        .remove_reaction(&user.address, &request.reactionable, request.reaction_type)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ─── Mentions ────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MentionsBody {
    pub body: String,
}

async fn translate_mentions(
    State(state): State<Arc<AppState>>,
    request: JsonBody<MentionsBody>,
) -> Result<Json<MentionsBody>> {
    let Json(request) = request?;
    let body = translate_to_cosmos(state.db.as_ref(), &request.body).await?;
    Ok(Json(MentionsBody { body }))
}

// ─── Invites ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
}

async fn create_invite(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    request: JsonBody<InviteRequest>,
) -> Result<Json<Invite>> {
    let Json(request) = request?;
    let email = request.email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(AppError::Unprocessable("Invalid email address".to_string()));
    }
    let user = user.ok_or(AppError::Unauthorized)?;

    let invite = state
        .db
        .add_invite(NewInvite {
            creator: user.address,
            friend_email: email,
        })
        .await?
        .ok_or_else(|| {
            AppError::Unprocessable("This user has already been invited".to_string())
        })?;
    tracing::info!(invite_id = invite.id, "Invite created");
    Ok(Json(invite))
}
