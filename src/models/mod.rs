// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Off-chain records stored in Postgres.

pub mod comment;
pub mod flag;
pub mod invite;
pub mod metric;
pub mod notification;
pub mod reaction;
pub mod track;
pub mod user;

pub use comment::{Comment, NewComment};
pub use flag::FlaggedStory;
pub use invite::{Invite, NewInvite};
pub use metric::UserMetric;
pub use notification::{
    MentionType, NewNotificationEvent, NotificationEvent, NotificationMeta, NotificationType,
};
pub use reaction::{NewReaction, Reaction, ReactionType, Reactionable, ReactionsCount};
pub use track::TrackEvent;
pub use user::{DeviceToken, NewUser, User};
