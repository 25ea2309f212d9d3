//! txwatch-core: foundation for the address-watching transaction indexer.
//!
//! # Architecture
//!
//! ```text
//! Parser → PollLoop
//!             ├── LedgerGateway    (chain height + per-block transactions)
//!             ├── ChainCursor      (last fully indexed block)
//!             ├── SubscriptionSet  (watched addresses)
//!             └── TransactionIndex (per-address ledgers, see txwatch-storage)
//! ```

pub mod config;
pub mod cursor;
pub mod error;
pub mod gateway;
pub mod subscription;
pub mod types;

pub use config::{ParserConfig, ParserState};
pub use cursor::ChainCursor;
pub use error::IndexerError;
pub use gateway::LedgerGateway;
pub use subscription::SubscriptionSet;
pub use types::{Address, BlockHeight, Transaction, TransactionHash};
