//! Connection settings for the ledger node.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where and how to reach the node's JSON-RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Basic-auth user; no `Authorization` header is sent when unset.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_hostname() -> String { "localhost".into() }
fn default_port() -> u16 { 4444 }
fn default_request_timeout_ms() -> u64 { 30_000 }

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            username: None,
            password: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RpcConfig {
    /// `http://host:port`, keeping an explicit scheme if `hostname` has one.
    pub fn endpoint(&self) -> String {
        let has_scheme = self.hostname.contains("//");
        let host = if !has_scheme && self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("[{}]", self.hostname)
        } else {
            self.hostname.clone()
        };
        let joined = format!("{host}:{}", self.port);
        if has_scheme {
            joined
        } else {
            format!("http://{joined}")
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Set basic-auth credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}
