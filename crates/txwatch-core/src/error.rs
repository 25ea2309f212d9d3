//! Error types for the txwatch pipeline.

use thiserror::Error;

use crate::types::Address;

/// Errors that can occur while polling, indexing or querying.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("{operation} timed out after {ms}ms")]
    Timeout { operation: String, ms: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Ledger for address {address} could not be (de)serialized: {reason}")]
    Serialization { address: Address, reason: String },

    #[error("Batch partially indexed: {} address(es) failed, {} indexed", failed.len(), indexed.len())]
    PartialBatch {
        /// Addresses whose write failed, with the failure text.
        failed: Vec<(Address, String)>,
        /// Addresses whose write succeeded.
        indexed: Vec<Address>,
    },

    #[error("parser is not running")]
    NotRunning,

    #[error("parser is already running")]
    AlreadyRunning,

    #[error("parser must be started inside a Tokio runtime")]
    NoRuntime,

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
}

impl IndexerError {
    /// Returns `true` for backend failures that the poll loop retries next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::Timeout { .. })
    }

    /// Returns `true` for lifecycle violations (`NotRunning`, `AlreadyRunning`, `NoRuntime`).
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NotRunning | Self::AlreadyRunning | Self::NoRuntime)
    }

    /// Returns `true` if the error came from the transaction store.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Serialization { .. } | Self::PartialBatch { .. }
        )
    }
}
