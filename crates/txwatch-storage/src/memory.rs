//! Ledger store on top of a key-value backend.
//!
//! Each address maps to one key holding its JSON-serialized ledger. Writers
//! of the same address are serialized by a per-address async lock; writers
//! of different addresses never share a lock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use txwatch_core::error::IndexerError;
use txwatch_core::types::{Address, Transaction};

use crate::index::TransactionIndex;
use crate::kv::{KeyValueStore, MemoryKeyValue};

/// Transaction index that keeps ledgers in a [`KeyValueStore`].
pub struct KvTransactionIndex<S> {
    store: S,
    writers: Mutex<HashMap<Address, Arc<AsyncMutex<()>>>>,
}

/// Process-lifetime index backed by [`MemoryKeyValue`].
pub type InMemoryTransactionIndex = KvTransactionIndex<MemoryKeyValue>;

impl InMemoryTransactionIndex {
    pub fn new() -> Self {
        Self::with_store(MemoryKeyValue::new())
    }
}

impl Default for InMemoryTransactionIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: KeyValueStore> KvTransactionIndex<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            writers: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying key-value store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn writer_lock(&self, address: &str) -> Arc<AsyncMutex<()>> {
        let mut writers = self.writers.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(writers.entry(address.to_string()).or_default())
    }

    async fn load(&self, address: &str) -> Result<Vec<Transaction>, IndexerError> {
        let Some(bytes) = self.store.get(address).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_slice(&bytes).map_err(|e| IndexerError::Serialization {
            address: address.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl<S: KeyValueStore> TransactionIndex for KvTransactionIndex<S> {
    async fn append(&self, address: &str, txs: Vec<Transaction>) -> Result<usize, IndexerError> {
        let lock = self.writer_lock(address);
        let _guard = lock.lock().await;

        let mut ledger = self.load(address).await?;
        let before = ledger.len();
        for tx in txs {
            if !ledger.contains(&tx) {
                ledger.push(tx);
            }
        }
        let appended = ledger.len() - before;
        if appended == 0 {
            return Ok(0);
        }

        let bytes = serde_json::to_vec(&ledger).map_err(|e| IndexerError::Serialization {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(address, bytes).await?;

        tracing::debug!(address, appended, total = ledger.len(), "ledger updated");
        Ok(appended)
    }

    async fn read_all(&self, address: &str) -> Result<Vec<Transaction>, IndexerError> {
        self.load(address).await
    }
}
