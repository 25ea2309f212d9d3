//! Scriptable ledger gateway and index wrappers shared by the engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use txwatch_core::error::IndexerError;
use txwatch_core::gateway::LedgerGateway;
use txwatch_core::types::{Address, BlockHeight, Transaction};
use txwatch_storage::{InMemoryTransactionIndex, TransactionIndex};

pub fn tx(id: &str, from: &str, to: &str, block: BlockHeight) -> Transaction {
    Transaction::new(id, from, to, block).with_value(Decimal::new(block, 0))
}

/// In-memory chain whose height, contents and failures are set by the test.
#[derive(Default)]
pub struct FakeGateway {
    height: AtomicI64,
    max_served: AtomicI64,
    height_fails: AtomicBool,
    unfiltered: AtomicBool,
    blocks: Mutex<HashMap<BlockHeight, Vec<Transaction>>>,
    failing_blocks: Mutex<HashSet<BlockHeight>>,
    stall: Mutex<Option<Duration>>,
    height_stall: Mutex<Option<Duration>>,
    fetched: Mutex<Vec<BlockHeight>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_height(&self, height: BlockHeight) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn push(&self, tx: Transaction) {
        self.blocks.lock().unwrap().entry(tx.block).or_default().push(tx);
    }

    pub fn fail_height(&self, fail: bool) {
        self.height_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_block(&self, block: BlockHeight) {
        self.failing_blocks.lock().unwrap().insert(block);
    }

    pub fn heal_block(&self, block: BlockHeight) {
        self.failing_blocks.lock().unwrap().remove(&block);
    }

    /// Return every transaction of a block, ignoring the address filter.
    pub fn serve_unfiltered(&self) {
        self.unfiltered.store(true, Ordering::SeqCst);
    }

    pub fn stall_blocks(&self, delay: Option<Duration>) {
        *self.stall.lock().unwrap() = delay;
    }

    pub fn stall_height(&self, delay: Option<Duration>) {
        *self.height_stall.lock().unwrap() = delay;
    }

    /// Blocks requested so far, in request order.
    pub fn fetched(&self) -> Vec<BlockHeight> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn max_height_served(&self) -> BlockHeight {
        self.max_served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerGateway for FakeGateway {
    async fn current_height(&self) -> Result<BlockHeight, IndexerError> {
        let stall = *self.height_stall.lock().unwrap();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if self.height_fails.load(Ordering::SeqCst) {
            return Err(IndexerError::Gateway("connection refused".into()));
        }
        let height = self.height.load(Ordering::SeqCst);
        self.max_served.fetch_max(height, Ordering::SeqCst);
        Ok(height)
    }

    async fn transactions_in_block(
        &self,
        block: BlockHeight,
        addresses: &HashSet<Address>,
    ) -> Result<Vec<Transaction>, IndexerError> {
        self.fetched.lock().unwrap().push(block);

        let stall = *self.stall.lock().unwrap();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if self.failing_blocks.lock().unwrap().contains(&block) {
            return Err(IndexerError::Gateway(format!("block {block} unavailable")));
        }

        let txs = self.blocks.lock().unwrap().get(&block).cloned().unwrap_or_default();
        if self.unfiltered.load(Ordering::SeqCst) {
            return Ok(txs);
        }
        Ok(txs
            .into_iter()
            .filter(|tx| addresses.contains(&tx.from) || addresses.contains(&tx.to))
            .collect())
    }
}

/// Index that refuses writes for one address while `broken` is set.
pub struct FlakyIndex {
    pub inner: InMemoryTransactionIndex,
    pub broken_address: String,
    pub broken: AtomicBool,
}

impl FlakyIndex {
    pub fn new(broken_address: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryTransactionIndex::new(),
            broken_address: broken_address.to_string(),
            broken: AtomicBool::new(true),
        })
    }

    pub fn heal(&self) {
        self.broken.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionIndex for FlakyIndex {
    async fn append(&self, address: &str, txs: Vec<Transaction>) -> Result<usize, IndexerError> {
        if self.broken.load(Ordering::SeqCst) && address == self.broken_address {
            return Err(IndexerError::Storage(format!("{address}: store unavailable")));
        }
        self.inner.append(address, txs).await
    }

    async fn read_all(&self, address: &str) -> Result<Vec<Transaction>, IndexerError> {
        if self.broken.load(Ordering::SeqCst) && address == self.broken_address {
            return Err(IndexerError::Storage(format!("{address}: store unavailable")));
        }
        self.inner.read_all(address).await
    }
}
