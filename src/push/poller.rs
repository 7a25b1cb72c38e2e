// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follows the chain and feeds new transaction events to the processor.

use std::sync::Arc;
use std::time::Duration;

use super::EventProcessor;
use crate::chain::{ChainError, ChainQuerier};

/// Consecutive failed fetches of one block before it is skipped.
pub const MAX_BLOCK_ATTEMPTS: u32 = 5;

pub struct BlockPoller {
    chain: Arc<dyn ChainQuerier>,
    processor: Arc<EventProcessor>,
    interval: Duration,
    /// Last height whose events were processed.
    processed_height: i64,
    /// Failed fetches of the block after `processed_height`.
    attempts: u32,
}

impl BlockPoller {
    /// Start after `processed_height`; blocks at or below it are skipped.
    pub fn new(
        chain: Arc<dyn ChainQuerier>,
        processor: Arc<EventProcessor>,
        interval: Duration,
        processed_height: i64,
    ) -> Self {
        Self {
            chain,
            processor,
            interval,
            processed_height,
            attempts: 0,
        }
    }

    pub fn processed_height(&self) -> i64 {
        self.processed_height
    }

    /// Process every block committed since the last poll. Returns the number
    /// of events handled.
    ///
    /// A block that fails to load is retried on the next poll, up to
    /// [`MAX_BLOCK_ATTEMPTS`] times. Blocks that cannot be decoded are
    /// skipped at once.
    pub async fn poll_once(&mut self) -> Result<usize, ChainError> {
        let latest = self.chain.latest_height().await?;
        let mut handled = 0;
        while self.processed_height < latest {
            let height = self.processed_height + 1;
            let events = match self.chain.tx_events(height).await {
                Ok(events) => events,
                Err(e) if self.should_skip(&e) => {
                    tracing::error!(
                        height,
                        attempts = self.attempts,
                        error = %e,
                        "Skipping block"
                    );
                    self.attempts = 0;
                    self.processed_height = height;
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.attempts = 0;
            for event in &events {
                self.processor.process_tx_event(event).await;
            }
            handled += events.len();
            self.processed_height = height;
        }
        Ok(handled)
    }

    fn should_skip(&mut self, error: &ChainError) -> bool {
        self.attempts += 1;
        matches!(error, ChainError::Decode(_)) || self.attempts >= MAX_BLOCK_ATTEMPTS
    }

    pub async fn run(mut self) {
        tracing::info!(height = self.processed_height, "Block poller started");
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            match self.poll_once().await {
                Ok(0) => {}
                Ok(handled) => tracing::debug!(
                    height = self.processed_height,
                    events = handled,
                    "Processed blocks"
                ),
                Err(e) => tracing::warn!(
                    height = self.processed_height,
                    error = %e,
                    "Polling chain failed"
                ),
            }
        }
    }
}
