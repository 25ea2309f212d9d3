//! HTTP JSON-RPC client backed by `reqwest`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::RpcConfig;
use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::RpcTransport;

/// JSON-RPC over HTTP POST.
///
/// Every request carries the configured timeout; a request that exceeds it
/// fails with [`TransportError::Timeout`].
pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
    credentials: Option<(String, Option<String>)>,
    request_timeout: Duration,
    ids: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: config.endpoint(),
            http,
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.password.clone())),
            request_timeout: config.request_timeout(),
            ids: AtomicU64::new(1),
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let mut builder = self
            .http
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&req);
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, password.as_deref());
        }

        tracing::trace!(method = %req.method, id = %req.id, url = %self.url, "rpc request");
        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| self.map_send_error(e))?;

        match serde_json::from_slice::<JsonRpcResponse>(&body) {
            Ok(rpc) => Ok(rpc),
            Err(_) if !status.is_success() => Err(TransportError::Http(format!(
                "rpc call {}() on {}: HTTP {}: {}",
                req.method,
                self.url,
                status.as_u16(),
                String::from_utf8_lossy(&body)
            ))),
            Err(e) => Err(TransportError::Deserialization(e)),
        }
    }

    fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed)
    }

    fn url(&self) -> &str {
        &self.url
    }
}
