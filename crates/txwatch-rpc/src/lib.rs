//! txwatch-rpc: JSON-RPC over HTTP ledger gateway.
//!
//! - [`RpcTransport`]: async transport trait with a typed `call` helper
//! - [`HttpRpcClient`]: `reqwest` transport with basic auth and a request timeout
//! - [`RpcLedgerGateway`]: [`LedgerGateway`](txwatch_core::LedgerGateway) over any transport

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod request;
pub mod transport;

pub use client::HttpRpcClient;
pub use config::RpcConfig;
pub use error::TransportError;
pub use gateway::{RpcLedgerGateway, RpcTransaction};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use transport::RpcTransport;
