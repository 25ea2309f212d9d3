//! `watch` flags with environment fallback.

use anyhow::{bail, Context};
use txwatch_core::config::ParserConfig;
use txwatch_rpc::RpcConfig;

use crate::logging::LogConfig;

/// Everything `txwatch watch` needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    pub rpc: RpcConfig,
    pub parser: ParserConfig,
    pub log: LogConfig,
    pub addresses: Vec<String>,
}

impl WatchOptions {
    /// Parse `args`, falling back to `env` for anything not given as a flag.
    pub fn parse(args: &[String], env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut rpc = RpcConfig::default();
        let mut parser = ParserConfig::default();
        let mut log = LogConfig::default();

        if let Some(host) = flag(args, "--host")?.or_else(|| env("TXWATCH_HOST")) {
            rpc.hostname = host;
        }
        if let Some(port) = flag(args, "--port")?.or_else(|| env("TXWATCH_PORT")) {
            rpc.port = port.parse().with_context(|| format!("invalid port: {port}"))?;
        }
        rpc.username = flag(args, "--user")?.or_else(|| env("TXWATCH_USER"));
        rpc.password = flag(args, "--password")?.or_else(|| env("TXWATCH_PASSWORD"));

        if let Some(ms) = flag(args, "--poll-ms")? {
            parser.poll_interval_ms = parse_millis(&ms, "--poll-ms")?;
        }
        if let Some(ms) = flag(args, "--timeout-ms")? {
            let ms = parse_millis(&ms, "--timeout-ms")?;
            parser.call_timeout_ms = ms;
            rpc.request_timeout_ms = ms;
        }

        if let Some(level) = flag(args, "--log-level")?.or_else(|| env("TXWATCH_LOG")) {
            log.level = level;
        }
        log.json = args.iter().any(|a| a == "--json-logs");

        let mut addresses = repeated(args, "--address")?;
        if addresses.is_empty() {
            if let Some(list) = env("TXWATCH_ADDRESSES") {
                addresses = list
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(String::from)
                    .collect();
            }
        }

        Ok(Self { rpc, parser, log, addresses })
    }
}

fn parse_millis(value: &str, name: &str) -> anyhow::Result<u64> {
    let ms: u64 = value.parse().with_context(|| format!("invalid {name}: {value}"))?;
    if ms == 0 {
        bail!("{name} must be greater than zero");
    }
    Ok(ms)
}

/// Value of the last occurrence of `name`.
fn flag(args: &[String], name: &str) -> anyhow::Result<Option<String>> {
    Ok(repeated(args, name)?.pop())
}

fn repeated(args: &[String], name: &str) -> anyhow::Result<Vec<String>> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == name {
            match iter.next() {
                Some(value) => values.push(value.clone()),
                None => bail!("{name} requires a value"),
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_flags() {
        let opts = WatchOptions::parse(&[], no_env).unwrap();
        assert_eq!(opts.rpc, RpcConfig::default());
        assert_eq!(opts.parser, ParserConfig::default());
        assert!(opts.addresses.is_empty());
        assert!(!opts.log.json);
    }

    #[test]
    fn flags_override_everything() {
        let opts = WatchOptions::parse(
            &args(&[
                "--host", "node", "--port", "8545", "--user", "rpc", "--password", "pw",
                "--address", "A", "--address", "B", "--poll-ms", "250", "--timeout-ms", "900",
                "--log-level", "debug", "--json-logs",
            ]),
            |_| Some("from-env".into()),
        )
        .unwrap();

        assert_eq!(opts.rpc.endpoint(), "http://node:8545");
        assert_eq!(opts.rpc.username.as_deref(), Some("rpc"));
        assert_eq!(opts.rpc.password.as_deref(), Some("pw"));
        assert_eq!(opts.rpc.request_timeout_ms, 900);
        assert_eq!(opts.parser.poll_interval_ms, 250);
        assert_eq!(opts.parser.call_timeout_ms, 900);
        assert_eq!(opts.addresses, vec!["A", "B"]);
        assert_eq!(opts.log.level, "debug");
        assert!(opts.log.json);
    }

    #[test]
    fn env_fallback() {
        let env: HashMap<&str, &str> = [
            ("TXWATCH_HOST", "10.0.0.2"),
            ("TXWATCH_ADDRESSES", "A, B,,C"),
            ("TXWATCH_LOG", "warn"),
        ]
        .into_iter()
        .collect();
        let opts = WatchOptions::parse(&[], |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(opts.rpc.hostname, "10.0.0.2");
        assert_eq!(opts.addresses, vec!["A", "B", "C"]);
        assert_eq!(opts.log.level, "warn");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(WatchOptions::parse(&args(&["--port", "http"]), no_env).is_err());
        assert!(WatchOptions::parse(&args(&["--poll-ms", "0"]), no_env).is_err());
        assert!(WatchOptions::parse(&args(&["--address"]), no_env).is_err());
    }
}
