//! txwatch CLI: watch addresses and index their transactions.
//!
//! Usage:
//! ```bash
//! txwatch watch --host localhost --port 4444 --user rpc --password secret \
//!     --address 0x1234567890abcdef1234567890abcdef12345678
//! txwatch version
//! ```

mod logging;
mod options;

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use txwatch_engine::{Parser, ParserBuilder};
use txwatch_rpc::{HttpRpcClient, RpcLedgerGateway};
use txwatch_storage::InMemoryTransactionIndex;

use crate::options::WatchOptions;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "watch" => cmd_watch(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("txwatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("txwatch {}", env!("CARGO_PKG_VERSION"));
    println!("Index ledger transactions for a set of watched addresses\n");
    println!("USAGE:");
    println!("    txwatch <COMMAND>\n");
    println!("COMMANDS:");
    println!("    watch    Poll the node and index transactions for the given addresses");
    println!("    version  Print version");
    println!("    help     Print this help\n");
    println!("WATCH FLAGS (env fallback in brackets):");
    println!("    --host <HOST>        Node hostname            [TXWATCH_HOST, default localhost]");
    println!("    --port <PORT>        Node port                [TXWATCH_PORT, default 4444]");
    println!("    --user <USER>        Basic-auth user          [TXWATCH_USER]");
    println!("    --password <PASS>    Basic-auth password      [TXWATCH_PASSWORD]");
    println!("    --address <ADDR>     Address to watch, repeatable [TXWATCH_ADDRESSES, comma-separated]");
    println!("    --poll-ms <MS>       Poll interval            [default 5000]");
    println!("    --timeout-ms <MS>    Per-call timeout         [default 30000]");
    println!("    --log-level <LEVEL>  Log level                [TXWATCH_LOG, default info]");
    println!("    --json-logs          Emit JSON logs");
}

async fn cmd_watch(args: &[String]) -> anyhow::Result<()> {
    let opts = WatchOptions::parse(args, |key| env::var(key).ok())?;
    logging::init_tracing(&opts.log)?;

    let client = HttpRpcClient::new(&opts.rpc).context("building RPC client")?;
    tracing::info!(url = %opts.rpc.endpoint(), "connecting to ledger node");

    let parser = ParserBuilder::from_config(opts.parser.clone()).build(
        Arc::new(RpcLedgerGateway::new(client)),
        Arc::new(InMemoryTransactionIndex::new()),
    );
    parser.run()?;

    for address in &opts.addresses {
        parser.subscribe(address)?;
    }
    if opts.addresses.is_empty() {
        tracing::warn!("no addresses given; the cursor will follow the chain head only");
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut status = tokio::time::interval(opts.parser.poll_interval());

    loop {
        tokio::select! {
            res = &mut shutdown => {
                res.context("listening for Ctrl-C")?;
                tracing::info!("shutdown requested");
                break;
            }
            _ = status.tick() => report_status(&parser, &opts.addresses).await,
        }
    }

    parser.shutdown().await;
    Ok(())
}

async fn report_status(parser: &Parser, addresses: &[String]) {
    let block = parser.get_current_block();
    for address in addresses {
        match parser.get_transactions(address).await {
            Ok(txs) => tracing::info!(block, address = %address, transactions = txs.len(), "status"),
            Err(e) => tracing::error!(block, address = %address, error = %e, "status unavailable"),
        }
    }
    if addresses.is_empty() {
        tracing::info!(block, "status");
    }
}
