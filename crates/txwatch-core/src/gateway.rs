//! The `LedgerGateway` trait: how the poll loop talks to the chain.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::IndexerError;
use crate::types::{Address, BlockHeight, Transaction};

/// Remote ledger queried by the poll loop.
///
/// The loop fetches one block at a time, pre-filtered to the watched
/// addresses. Implementations must be `Send + Sync` so the loop can run on
/// its own Tokio task.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Current chain height.
    async fn current_height(&self) -> Result<BlockHeight, IndexerError>;

    /// Transactions in `block` whose sender or receiver is in `addresses`.
    async fn transactions_in_block(
        &self,
        block: BlockHeight,
        addresses: &HashSet<Address>,
    ) -> Result<Vec<Transaction>, IndexerError>;
}

#[async_trait]
impl<G: LedgerGateway + ?Sized> LedgerGateway for std::sync::Arc<G> {
    async fn current_height(&self) -> Result<BlockHeight, IndexerError> {
        (**self).current_height().await
    }

    async fn transactions_in_block(
        &self,
        block: BlockHeight,
        addresses: &HashSet<Address>,
    ) -> Result<Vec<Transaction>, IndexerError> {
        (**self).transactions_in_block(block, addresses).await
    }
}
