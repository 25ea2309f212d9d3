//! txwatch-storage: address-indexed transaction store.
//!
//! Layers:
//! - [`kv`]: byte-oriented key-value backends (in-memory)
//! - [`index`]: the [`TransactionIndex`] contract and batch grouping
//! - [`memory`]: [`KvTransactionIndex`], JSON ledgers on top of a key-value store

pub mod index;
pub mod kv;
pub mod memory;

pub use index::{group_by_address, BatchReport, TransactionIndex};
pub use kv::{KeyValueStore, MemoryKeyValue};
pub use memory::{InMemoryTransactionIndex, KvTransactionIndex};
