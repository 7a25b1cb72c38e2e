// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! truapi: REST and GraphQL API of TruStory.

use anyhow::Context;
use octopus::{
    chain::ChainClient, config::Config, db::PgDatastore, logging, services::CommentNotifier,
    AppState,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.host.port, "Starting truapi");

    let db = PgDatastore::connect(&config.database)
        .await
        .context("Failed to connect to Postgres")?;

    let http = config
        .http
        .client()
        .context("Failed to build HTTP client")?;

    let chain = ChainClient::new(http.clone(), &config.chain);
    tracing::info!(rpc = %config.chain.rpc_url, chain_id = %config.chain.chain_id, "Chain client ready");

    let notifier = CommentNotifier::spawn(http.clone(), &config.push.endpoint_url);

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(db),
        Arc::new(chain),
        notifier,
        http,
    ));

    let app = octopus::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.host.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
