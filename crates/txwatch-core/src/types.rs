//! Shared types for the indexing pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Chain-specific account identifier. Opaque to the core.
pub type Address = String;

/// Ledger transaction identifier.
pub type TransactionHash = String;

/// Block height. `0` means "nothing processed yet".
pub type BlockHeight = i64;

// ─── Transaction ──────────────────────────────────────────────────────────────

/// A ledger transaction recorded against the addresses it touches.
///
/// Two backend shapes populate this type. One reports `value`/`fee`
/// directly, the other reports raw `gas`/`gasPrice` strings. Amounts that a
/// backend does not report stay at zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Sender address.
    pub from: Address,
    /// Receiver address.
    pub to: Address,
    /// Transaction hash / id.
    #[serde(alias = "txid")]
    pub id: TransactionHash,
    /// Block the transaction was included in.
    #[serde(default)]
    pub block: BlockHeight,
    #[serde(default)]
    pub fee: Decimal,
    /// Transferred amount.
    #[serde(default, alias = "amount")]
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

impl Transaction {
    /// Create a transaction with zero amounts and no gas fields.
    pub fn new(
        id: impl Into<TransactionHash>,
        from: impl Into<Address>,
        to: impl Into<Address>,
        block: BlockHeight,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            id: id.into(),
            block,
            fee: Decimal::ZERO,
            value: Decimal::ZERO,
            gas: None,
            gas_price: None,
        }
    }

    /// Set the transferred value.
    pub fn with_value(mut self, value: Decimal) -> Self {
        self.value = value;
        self
    }

    /// Set the fee.
    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee = fee;
        self
    }

    /// Set the raw gas fields.
    pub fn with_gas(mut self, gas: impl Into<String>, gas_price: impl Into<String>) -> Self {
        self.gas = Some(gas.into());
        self.gas_price = Some(gas_price.into());
        self
    }

    /// Returns `true` if `address` is the sender or the receiver.
    pub fn touches(&self, address: &str) -> bool {
        self.from == address || self.to == address
    }

    /// Returns `true` if sender and receiver are the same address.
    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
