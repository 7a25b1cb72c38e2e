// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! pushd: turns chain events and comments into push notifications.

use anyhow::Context;
use octopus::{
    chain::{ChainClient, ChainQuerier},
    config::Config,
    db::PgDatastore,
    logging,
    push::{
        gateway::ExpoGateway, poller::BlockPoller, sender::NotificationSender, server,
        EventProcessor, CHANNEL_CAPACITY,
    },
};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.push.port, "Starting pushd");

    let db = Arc::new(
        PgDatastore::connect(&config.database)
            .await
            .context("Failed to connect to Postgres")?,
    );
    let http = config
        .http
        .client()
        .context("Failed to build HTTP client")?;
    let chain: Arc<dyn ChainQuerier> = Arc::new(ChainClient::new(http.clone(), &config.chain));

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let gateway = Arc::new(ExpoGateway::new(http, &config.push.gateway_url));
    let sender = NotificationSender::new(db.clone(), gateway);
    tokio::spawn(sender.run(rx));

    let processor = Arc::new(EventProcessor::new(db, chain.clone(), tx));

    // Only blocks committed after startup are notified.
    let start = chain
        .latest_height()
        .await
        .context("Failed to read latest block height")?;
    let poller = BlockPoller::new(
        chain,
        processor.clone(),
        config.chain.poll_interval,
        start,
    );
    tokio::spawn(poller.run());

    let app = server::create_router(processor);
    let addr = format!("0.0.0.0:{}", config.push.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "pushd listening");

    axum::serve(listener, app).await?;
    Ok(())
}
