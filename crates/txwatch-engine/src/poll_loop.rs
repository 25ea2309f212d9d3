//! The poll loop: one tick per interval.
//!
//! Each tick:
//!   - reads the chain height from the gateway
//!   - walks every block in `(cursor, height]` in increasing order
//!   - fetches the block's transactions for the watched addresses
//!   - indexes them, then advances the cursor to that block
//!
//! A failed or timed-out call aborts the tick where it is. The cursor stays
//! on the last fully indexed block and the next tick resumes from there.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use txwatch_core::config::ParserConfig;
use txwatch_core::cursor::ChainCursor;
use txwatch_core::error::IndexerError;
use txwatch_core::gateway::LedgerGateway;
use txwatch_core::subscription::SubscriptionSet;
use txwatch_core::types::BlockHeight;
use txwatch_storage::TransactionIndex;

/// Shared engine state: owned by the parser, borrowed by the loop task.
pub struct EngineContext {
    gateway: Arc<dyn LedgerGateway>,
    index: Arc<dyn TransactionIndex>,
    subscriptions: SubscriptionSet,
    cursor: ChainCursor,
    config: ParserConfig,
}

impl EngineContext {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        index: Arc<dyn TransactionIndex>,
        config: ParserConfig,
    ) -> Self {
        Self {
            gateway,
            index,
            subscriptions: SubscriptionSet::new(),
            cursor: ChainCursor::new(),
            config,
        }
    }

    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    pub fn cursor(&self) -> &ChainCursor {
        &self.cursor
    }

    pub fn index(&self) -> &dyn TransactionIndex {
        self.index.as_ref()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// The chain height could not be read; nothing changed.
    GatewayUnavailable { error: IndexerError },
    /// The cursor is already at the chain height.
    UpToDate { height: BlockHeight },
    /// No address is watched; the cursor moved to the chain height.
    NoSubscribers { advanced_to: BlockHeight },
    /// Every block in `from..=to` was indexed.
    Indexed {
        from: BlockHeight,
        to: BlockHeight,
        transactions: usize,
    },
    /// Processing stopped at `at_block`; the cursor holds at `at_block - 1`.
    Aborted {
        at_block: BlockHeight,
        error: IndexerError,
    },
}

/// The background polling loop.
pub struct PollLoop {
    ctx: Arc<EngineContext>,
}

impl PollLoop {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Tick on the configured interval until `cancel` fires.
    ///
    /// Cancellation is checked between ticks only; a tick in progress always
    /// runs to completion.
    pub async fn run(self, cancel: CancellationToken) {
        let period = self.ctx.config.poll_interval().max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval fires immediately; polling starts one period in.
        ticker.tick().await;

        tracing::info!(poll_interval_ms = period.as_millis() as u64, "poll loop started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        tracing::info!(cursor = self.ctx.cursor.current(), "poll loop stopped");
    }

    /// Run one poll cycle.
    pub async fn tick(&self) -> TickOutcome {
        let ctx = &self.ctx;

        let height = match self.bounded("current_height", ctx.gateway.current_height()).await {
            Ok(h) => h,
            Err(error) => {
                tracing::warn!(error = %error, "could not read chain height, skipping tick");
                return TickOutcome::GatewayUnavailable { error };
            }
        };

        let cursor = ctx.cursor.current();
        if height <= cursor {
            tracing::trace!(height, cursor, "no new blocks");
            return TickOutcome::UpToDate { height };
        }

        let watched = ctx.subscriptions.snapshot();
        if watched.is_empty() {
            let advanced_to = ctx.cursor.advance(height);
            tracing::debug!(advanced_to, "no subscribers, cursor moved to head");
            return TickOutcome::NoSubscribers { advanced_to };
        }

        let from = cursor + 1;
        let mut transactions = 0usize;

        for block in from..=height {
            let fetched = match self
                .bounded(
                    "transactions_in_block",
                    ctx.gateway.transactions_in_block(block, &watched),
                )
                .await
            {
                Ok(txs) => txs,
                Err(error) => {
                    tracing::warn!(block, error = %error, "block fetch failed, aborting tick");
                    return TickOutcome::Aborted { at_block: block, error };
                }
            };

            let matching: Vec<_> = fetched
                .into_iter()
                .filter(|tx| watched.contains(&tx.from) || watched.contains(&tx.to))
                .collect();

            if !matching.is_empty() {
                let count = matching.len();
                if let Err(error) = ctx.index.append_all(matching).await {
                    tracing::warn!(block, error = %error, "indexing failed, aborting tick");
                    return TickOutcome::Aborted { at_block: block, error };
                }
                transactions += count;
                tracing::debug!(block, count, "indexed block transactions");
            }

            ctx.cursor.advance(block);
        }

        tracing::info!(
            from,
            to = height,
            transactions,
            watched = watched.len(),
            "blocks indexed"
        );
        TickOutcome::Indexed { from, to: height, transactions }
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, IndexerError>>,
    ) -> Result<T, IndexerError> {
        let limit = self.ctx.config.call_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(IndexerError::Timeout {
                operation: operation.to_string(),
                ms: limit.as_millis() as u64,
            }),
        }
    }
}
