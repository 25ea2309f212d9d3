//! Chain cursor: the last block whose transactions are confirmed indexed.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::types::BlockHeight;

/// Atomically updated "last processed block" counter.
///
/// The cursor never moves backwards: [`advance`](Self::advance) is a
/// `fetch_max`, so a stale writer cannot undo a newer position.
#[derive(Debug, Default)]
pub struct ChainCursor {
    height: AtomicI64,
}

impl ChainCursor {
    /// Create a cursor at height `0` (nothing processed yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Last fully indexed block.
    pub fn current(&self) -> BlockHeight {
        self.height.load(Ordering::Acquire)
    }

    /// Move the cursor to `height` if it is ahead of the current position.
    ///
    /// Returns the position after the call.
    pub fn advance(&self, height: BlockHeight) -> BlockHeight {
        let prev = self.height.fetch_max(height, Ordering::AcqRel);
        prev.max(height)
    }

    /// Returns the next block to process (cursor + 1).
    pub fn next_block(&self) -> BlockHeight {
        self.current() + 1
    }
}
