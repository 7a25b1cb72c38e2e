// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! spotlightd: renders claim share cards.

use anyhow::Context;
use octopus::{
    chain::ChainClient,
    config::Config,
    db::PgDatastore,
    logging,
    spotlight::{create_router, SpotlightState},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.spotlight.port, "Starting spotlightd");

    let db = PgDatastore::connect(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    let http = config
        .http
        .client()
        .context("Failed to build HTTP client")?;
    let state = SpotlightState {
        chain: Arc::new(ChainClient::new(http, &config.chain)),
        db: Arc::new(db),
    };

    let addr = format!("0.0.0.0:{}", config.spotlight.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "spotlightd listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
