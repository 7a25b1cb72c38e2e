// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - clients for the systems truapi and the actions talk to.

pub mod comment_notifier;
pub mod postman;
pub mod presign;

pub use comment_notifier::CommentNotifier;
pub use postman::{Mailer, Message, Postman, PostmanError};
