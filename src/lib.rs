// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Octopus: the TruStory backend.
//!
//! This crate provides the services sitting next to the TruStory chain:
//! `truapi` (REST + GraphQL), `pushd` (push notifications from chain
//! events), `spotlightd` (claim share cards) and `tructl` (batch actions).

pub mod actions;
pub mod chain;
pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod logging;
pub mod mentions;
pub mod middleware;
pub mod models;
pub mod push;
pub mod routes;
pub mod services;
pub mod spotlight;
pub mod time_utils;

use std::sync::Arc;

use chain::ChainQuerier;
use config::Config;
use db::Datastore;
use services::CommentNotifier;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Datastore>,
    pub chain: Arc<dyn ChainQuerier>,
    pub schema: graphql::AppSchema,
    pub comment_notifications: CommentNotifier,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn Datastore>,
        chain: Arc<dyn ChainQuerier>,
        comment_notifications: CommentNotifier,
        http: reqwest::Client,
    ) -> Self {
        Self {
            config,
            db,
            chain,
            schema: graphql::build_schema(),
            comment_notifications,
            http,
        }
    }
}
