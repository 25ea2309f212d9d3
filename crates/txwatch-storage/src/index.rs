//! The `TransactionIndex` contract.
//!
//! Every transaction is recorded under each address it touches, so a
//! transfer between A and B lands once in A's ledger and once in B's.
//! Ledgers are append-only.

use async_trait::async_trait;
use std::collections::BTreeMap;

use txwatch_core::error::IndexerError;
use txwatch_core::types::{Address, Transaction};

/// Outcome of a fully successful [`TransactionIndex::append_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Addresses whose ledger was written, in sorted order.
    pub addresses: Vec<Address>,
    /// Entries actually appended across all ledgers.
    pub appended: usize,
}

/// Group a mixed batch by every address it touches (sender and receiver).
///
/// Order inside each group follows the input order. A self-transfer is
/// grouped once under its single address.
pub fn group_by_address(txs: &[Transaction]) -> BTreeMap<Address, Vec<Transaction>> {
    let mut groups: BTreeMap<Address, Vec<Transaction>> = BTreeMap::new();
    for tx in txs {
        groups.entry(tx.from.clone()).or_default().push(tx.clone());
        if !tx.is_self_transfer() {
            groups.entry(tx.to.clone()).or_default().push(tx.clone());
        }
    }
    groups
}

/// Address-indexed transaction store.
#[async_trait]
pub trait TransactionIndex: Send + Sync {
    /// Append `txs` to the end of `address`'s ledger.
    ///
    /// The read-modify-write is atomic with respect to other writers of the
    /// same address. Entries already present in the ledger are skipped, so
    /// retrying a block does not duplicate it. Returns the number of entries
    /// appended.
    async fn append(&self, address: &str, txs: Vec<Transaction>) -> Result<usize, IndexerError>;

    /// Full ledger for `address`; empty if it was never written.
    async fn read_all(&self, address: &str) -> Result<Vec<Transaction>, IndexerError>;

    /// Index a mixed batch: one append per touched address.
    ///
    /// Addresses are written independently. If some fail, the others are
    /// still written and the call returns [`IndexerError::PartialBatch`]
    /// listing both sides.
    async fn append_all(&self, txs: Vec<Transaction>) -> Result<BatchReport, IndexerError> {
        let groups = group_by_address(&txs);
        let writes = groups.into_iter().map(|(address, group)| async move {
            let result = self.append(&address, group).await;
            (address, result)
        });

        let mut report = BatchReport::default();
        let mut failed = Vec::new();
        for (address, result) in futures::future::join_all(writes).await {
            match result {
                Ok(n) => {
                    report.appended += n;
                    report.addresses.push(address);
                }
                Err(e) => {
                    tracing::warn!(%address, error = %e, "ledger append failed");
                    failed.push((address, e.to_string()));
                }
            }
        }

        if failed.is_empty() {
            Ok(report)
        } else {
            Err(IndexerError::PartialBatch {
                failed,
                indexed: report.addresses,
            })
        }
    }

    /// Index a single transaction under its sender and receiver.
    async fn save(&self, tx: Transaction) -> Result<(), IndexerError> {
        self.append_all(vec![tx]).await.map(|_| ())
    }
}
