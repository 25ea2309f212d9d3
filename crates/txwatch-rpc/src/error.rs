//! Transport-level error types.

use thiserror::Error;

use txwatch_core::error::IndexerError;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC transport operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, bad status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }

    /// Map into the indexer taxonomy, tagging timeouts with `operation`.
    pub fn into_indexer(self, operation: &str) -> IndexerError {
        match self {
            Self::Timeout { ms } => IndexerError::Timeout {
                operation: operation.to_string(),
                ms,
            },
            other => IndexerError::Gateway(format!("{operation}: {other}")),
        }
    }
}
