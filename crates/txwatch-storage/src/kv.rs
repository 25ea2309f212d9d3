//! Key-value backends that hold serialized ledgers.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use txwatch_core::error::IndexerError;

/// Minimal byte store keyed by string.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value for `key`, or `None` if it was never written.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexerError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), IndexerError>;
}

/// In-memory key-value store.
///
/// All data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryKeyValue {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKeyValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValue {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexerError> {
        Ok(self
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), IndexerError> {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}
