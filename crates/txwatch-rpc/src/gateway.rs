//! `LedgerGateway` over a JSON-RPC node.
//!
//! Methods used:
//! - `getblockcount` → current height
//! - `transaction ["list", <block>]` → transactions from a block onwards
//! - `gettransaction [<txid>]` → a single transaction

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use txwatch_core::error::IndexerError;
use txwatch_core::gateway::LedgerGateway;
use txwatch_core::types::{Address, BlockHeight, Transaction};

use crate::transport::RpcTransport;

/// Transaction record as returned by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcTransaction {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default)]
    pub block: BlockHeight,
    pub from: Address,
    pub to: Address,
    pub txid: String,
}

impl From<RpcTransaction> for Transaction {
    fn from(raw: RpcTransaction) -> Self {
        Transaction::new(raw.txid, raw.from, raw.to, raw.block)
            .with_value(raw.amount)
            .with_fee(raw.fee)
    }
}

/// Keep the records of exactly `block` that touch one of `addresses`.
///
/// Records are matched on their raw `block`, `from` and `to` fields and only
/// then decoded, one at a time. A record that fails to decode is logged and
/// skipped; it never fails the rest of the block.
///
/// `transaction ["list", b]` returns every record from block `b` onwards, so
/// walking N blocks one call at a time transfers O(N²) records. The first
/// tick from cursor 0 pays the most.
pub fn select_for_block(
    records: Vec<Value>,
    block: BlockHeight,
    addresses: &HashSet<Address>,
) -> Vec<Transaction> {
    records
        .into_iter()
        .filter(|r| record_matches(r, block, addresses))
        .filter_map(|r| {
            let txid = str_field(&r, "txid").unwrap_or_default().to_string();
            match serde_json::from_value::<RpcTransaction>(r) {
                Ok(raw) => Some(Transaction::from(raw)),
                Err(e) => {
                    tracing::warn!(block, txid = %txid, error = %e, "skipping undecodable transaction record");
                    None
                }
            }
        })
        .collect()
}

fn record_matches(record: &Value, block: BlockHeight, addresses: &HashSet<Address>) -> bool {
    record.get("block").and_then(Value::as_i64) == Some(block)
        && [str_field(record, "from"), str_field(record, "to")]
            .into_iter()
            .flatten()
            .any(|a| addresses.contains(a))
}

fn str_field<'a>(record: &'a Value, name: &str) -> Option<&'a str> {
    record.get(name).and_then(Value::as_str)
}

/// Ledger gateway backed by an [`RpcTransport`].
pub struct RpcLedgerGateway<T> {
    transport: T,
}

impl<T: RpcTransport> RpcLedgerGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Look up one transaction by id.
    pub async fn transaction(&self, txid: &str) -> Result<Transaction, IndexerError> {
        self.transport
            .call::<RpcTransaction>("gettransaction", vec![json!(txid)])
            .await
            .map(Transaction::from)
            .map_err(|e| e.into_indexer("gettransaction"))
    }
}

#[async_trait]
impl<T: RpcTransport> LedgerGateway for RpcLedgerGateway<T> {
    async fn current_height(&self) -> Result<BlockHeight, IndexerError> {
        self.transport
            .call::<BlockHeight>("getblockcount", vec![])
            .await
            .map_err(|e| e.into_indexer("getblockcount"))
    }

    async fn transactions_in_block(
        &self,
        block: BlockHeight,
        addresses: &HashSet<Address>,
    ) -> Result<Vec<Transaction>, IndexerError> {
        let records: Vec<Value> = self
            .transport
            .call("transaction", vec![json!("list"), json!(block)])
            .await
            .map_err(|e| e.into_indexer("transaction list"))?;

        let total = records.len();
        let selected = select_for_block(records, block, addresses);
        tracing::debug!(block, total, selected = selected.len(), "fetched block transactions");
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use crate::error::TransportError;
    use crate::request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};

    /// Transport answering every call with one canned response.
    struct Canned {
        result: Result<Value, JsonRpcError>,
        seen: Mutex<Vec<JsonRpcRequest>>,
        ids: AtomicU64,
    }

    impl Canned {
        fn ok(result: Value) -> Self {
            Self { result: Ok(result), seen: Mutex::new(vec![]), ids: AtomicU64::new(1) }
        }

        fn err(code: i64, message: &str) -> Self {
            Self {
                result: Err(JsonRpcError { code, message: message.into(), data: None }),
                seen: Mutex::new(vec![]),
                ids: AtomicU64::new(1),
            }
        }
    }

    #[async_trait]
    impl RpcTransport for Canned {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
            let id = req.id.clone();
            self.seen.lock().unwrap().push(req);
            let (result, error) = match &self.result {
                Ok(v) => (Some(v.clone()), None),
                Err(e) => (None, Some(e.clone())),
            };
            Ok(JsonRpcResponse { jsonrpc: "2.0".into(), id, result, error })
        }

        fn next_id(&self) -> u64 {
            self.ids.fetch_add(1, Ordering::Relaxed)
        }

        fn url(&self) -> &str {
            "canned"
        }
    }

    fn watched(addrs: &[&str]) -> HashSet<Address> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    #[tokio::test]
    async fn current_height_calls_getblockcount() {
        let gateway = RpcLedgerGateway::new(Canned::ok(json!(1234)));
        assert_eq!(gateway.current_height().await.unwrap(), 1234);

        let seen = gateway.transport().seen.lock().unwrap();
        assert_eq!(seen[0].method, "getblockcount");
        assert!(seen[0].params.is_empty());
        assert_eq!(seen[0].id, RpcId::Number(1));
    }

    #[tokio::test]
    async fn block_query_keeps_block_and_watched_addresses() {
        let gateway = RpcLedgerGateway::new(Canned::ok(json!([
            {"txid": "t1", "from": "A", "to": "B", "block": 5, "amount": 2, "fee": 0.5},
            {"txid": "t2", "from": "C", "to": "D", "block": 5, "amount": 1, "fee": 0.5},
            {"txid": "t3", "from": "B", "to": "A", "block": 6, "amount": 3, "fee": 0.5}
        ])));

        let txs = gateway.transactions_in_block(5, &watched(&["A"])).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id, "t1");
        assert_eq!(txs[0].value, Decimal::new(2, 0));
        assert_eq!(txs[0].fee, Decimal::new(5, 1));
        assert!(txs[0].gas.is_none());

        let seen = gateway.transport().seen.lock().unwrap();
        assert_eq!(seen[0].method, "transaction");
        assert_eq!(seen[0].params, vec![json!("list"), json!(5)]);
    }

    #[tokio::test]
    async fn undecodable_record_does_not_block_the_rest() {
        let gateway = RpcLedgerGateway::new(Canned::ok(json!([
            {"txid": "t1", "from": "A", "to": "B", "block": 5, "amount": 2, "fee": 0.5},
            {"txid": "t2", "from": "C", "to": "D", "block": 5, "amount": 1e29, "fee": 0.5},
            {"txid": "t3", "from": "E", "to": "A", "block": 5, "amount": 1e29, "fee": 0.5},
            {"txid": "t4", "from": "B", "to": "A", "block": 5, "amount": 3, "fee": 0.5}
        ])));

        let txs = gateway.transactions_in_block(5, &watched(&["A"])).await.unwrap();
        let ids: Vec<_> = txs.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t4"]);
    }

    #[test]
    fn records_without_block_or_addresses_are_dropped() {
        let records = vec![
            json!({"txid": "t1", "from": "A", "to": "B"}),
            json!({"txid": "t2", "block": 5, "to": 7}),
            json!({"txid": "t3", "from": "X", "to": "A", "block": 5}),
        ];
        let txs = select_for_block(records, 5, &watched(&["A"]));
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id, "t3");
    }

    #[tokio::test]
    async fn node_error_is_gateway_error() {
        let gateway = RpcLedgerGateway::new(Canned::err(-28, "Loading block index"));
        let err = gateway.current_height().await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("Loading block index"));
    }

    #[tokio::test]
    async fn malformed_result_is_gateway_error() {
        let gateway = RpcLedgerGateway::new(Canned::ok(json!({"unexpected": true})));
        let err = gateway.transactions_in_block(1, &watched(&["A"])).await.unwrap_err();
        assert!(matches!(err, IndexerError::Gateway(_)));
    }

    #[tokio::test]
    async fn single_transaction_lookup() {
        let gateway = RpcLedgerGateway::new(Canned::ok(
            json!({"txid": "t9", "from": "A", "to": "B", "block": 9}),
        ));
        let tx = gateway.transaction("t9").await.unwrap();
        assert_eq!(tx.block, 9);
        assert_eq!(tx.value, Decimal::ZERO);

        let seen = gateway.transport().seen.lock().unwrap();
        assert_eq!(seen[0].method, "gettransaction");
        assert_eq!(seen[0].params, vec![json!("t9")]);
    }
}
