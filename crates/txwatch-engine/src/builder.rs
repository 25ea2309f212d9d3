//! Fluent builder API for creating parsers.
//!
//! # Example
//!
//! ```rust
//! use txwatch_engine::ParserBuilder;
//!
//! let config = ParserBuilder::new()
//!     .poll_interval_ms(1_000)
//!     .call_timeout_ms(10_000)
//!     .build_config();
//! assert_eq!(config.poll_interval_ms, 1_000);
//! ```

use std::sync::Arc;
use std::time::Duration;

use txwatch_core::config::ParserConfig;
use txwatch_core::gateway::LedgerGateway;
use txwatch_storage::TransactionIndex;

use crate::parser::Parser;

/// Fluent builder for `ParserConfig` and `Parser`.
#[derive(Debug, Default)]
pub struct ParserBuilder {
    config: ParserConfig,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Set the polling interval in milliseconds.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the polling interval.
    pub fn poll_interval(self, interval: Duration) -> Self {
        self.poll_interval_ms(interval.as_millis() as u64)
    }

    /// Set the per-call gateway timeout in milliseconds.
    pub fn call_timeout_ms(mut self, ms: u64) -> Self {
        self.config.call_timeout_ms = ms;
        self
    }

    /// Set the per-call gateway timeout.
    pub fn call_timeout(self, timeout: Duration) -> Self {
        self.call_timeout_ms(timeout.as_millis() as u64)
    }

    /// Build the `ParserConfig`.
    pub fn build_config(self) -> ParserConfig {
        self.config
    }

    /// Build a stopped `Parser` over `gateway` and `index`.
    pub fn build(
        self,
        gateway: Arc<dyn LedgerGateway>,
        index: Arc<dyn TransactionIndex>,
    ) -> Parser {
        Parser::new(gateway, index, self.config)
    }
}
