// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_graphql::{Context, Object, Result};

use super::objects::CommentObject;
use super::{app_state, session_user};
use crate::routes::content::{create_comment, AddCommentRequest};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Post a comment as the session user.
    async fn add_comment(
        &self,
        ctx: &Context<'_>,
        parent_id: Option<i64>,
        claim_id: i64,
        argument_id: Option<i64>,
        body: String,
    ) -> Result<CommentObject> {
        let state = app_state(ctx)?;
        let user = session_user(ctx)?;
        let comment = create_comment(
            state,
            &user.address,
            AddCommentRequest {
                parent_id,
                claim_id,
                argument_id,
                body,
            },
        )
        .await?;
        Ok(CommentObject(comment))
    }
}
