//! The parser facade: subscribe, query, current block, start/stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use txwatch_core::config::{ParserConfig, ParserState};
use txwatch_core::error::IndexerError;
use txwatch_core::gateway::LedgerGateway;
use txwatch_core::types::{BlockHeight, Transaction};
use txwatch_storage::TransactionIndex;

use crate::poll_loop::{EngineContext, PollLoop};

struct LoopTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Watches addresses and indexes their transactions as new blocks arrive.
///
/// `subscribe`, `get_transactions` and `get_current_block` may be called
/// from any number of tasks or threads, including while a tick is running.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use txwatch_core::LedgerGateway;
/// # async fn example(gateway: Arc<dyn LedgerGateway>) -> Result<(), txwatch_core::IndexerError> {
/// use txwatch_engine::ParserBuilder;
/// use txwatch_storage::InMemoryTransactionIndex;
///
/// let parser = ParserBuilder::new()
///     .poll_interval_ms(5_000)
///     .build(gateway, Arc::new(InMemoryTransactionIndex::new()));
///
/// parser.run()?;
/// parser.subscribe("0x1234567890abcdef1234567890abcdef12345678")?;
/// let txs = parser.get_transactions("0x1234567890abcdef1234567890abcdef12345678").await?;
/// parser.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Parser {
    ctx: Arc<EngineContext>,
    running: Arc<AtomicBool>,
    task: Mutex<Option<LoopTask>>,
}

impl Parser {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        index: Arc<dyn TransactionIndex>,
        config: ParserConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(EngineContext::new(gateway, index, config)),
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Start the poll loop in the background and return immediately.
    ///
    /// Fails with [`IndexerError::AlreadyRunning`] if a loop is already
    /// active, and with [`IndexerError::NoRuntime`] outside a Tokio runtime.
    pub fn run(&self) -> Result<(), IndexerError> {
        self.run_with_cancel(CancellationToken::new())
    }

    /// Like [`run`](Self::run), but the loop also stops when `parent` is cancelled.
    pub fn run_with_cancel(&self, parent: CancellationToken) -> Result<(), IndexerError> {
        let runtime = Handle::try_current().map_err(|_| IndexerError::NoRuntime)?;
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(IndexerError::AlreadyRunning);
        }

        let cancel = parent.child_token();
        let poll = PollLoop::new(Arc::clone(&self.ctx));
        let running = Arc::clone(&self.running);
        let token = cancel.clone();
        let handle = runtime.spawn(async move {
            poll.run(token).await;
            running.store(false, Ordering::Release);
        });

        *slot = Some(LoopTask { cancel, handle });
        tracing::info!(cursor = self.ctx.cursor().current(), "parser started");
        Ok(())
    }

    /// Watch `address`. Returns `true` if it was not watched before.
    pub fn subscribe(&self, address: &str) -> Result<bool, IndexerError> {
        self.ensure_running()?;
        if address.is_empty() {
            return Err(IndexerError::InvalidAddress(address.to_string()));
        }

        let added = self.ctx.subscriptions().add(address);
        if added {
            tracing::info!(address, watched = self.ctx.subscriptions().len(), "address subscribed");
        }
        Ok(added)
    }

    /// Every transaction indexed for `address` so far, oldest first.
    ///
    /// An address that was never indexed yields an empty list.
    pub async fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, IndexerError> {
        self.ensure_running()?;
        self.ctx.index().read_all(address).await.map_err(|e| {
            tracing::error!(address, error = %e, "failed to read transactions");
            e
        })
    }

    /// Last fully indexed block (`0` before the first tick).
    pub fn get_current_block(&self) -> BlockHeight {
        self.ctx.cursor().current()
    }

    pub fn state(&self) -> ParserState {
        if self.running.load(Ordering::Acquire) {
            ParserState::Running
        } else {
            ParserState::Stopped
        }
    }

    /// Number of watched addresses.
    pub fn subscription_count(&self) -> usize {
        self.ctx.subscriptions().len()
    }

    /// Stop the poll loop and wait for it to exit.
    ///
    /// A tick in progress finishes first. Afterwards the parser is
    /// [`ParserState::Stopped`] and `run` may be called again.
    pub async fn shutdown(&self) {
        let Some(task) = self.take_task() else {
            return;
        };
        task.cancel.cancel();
        self.await_task(task.handle).await;
    }

    /// Wait for the poll loop to exit without cancelling it.
    pub async fn join(&self) {
        if let Some(task) = self.take_task() {
            self.await_task(task.handle).await;
        }
    }

    fn take_task(&self) -> Option<LoopTask> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    async fn await_task(&self, handle: JoinHandle<()>) {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "poll loop task failed");
            self.running.store(false, Ordering::Release);
        }
        tracing::info!(cursor = self.ctx.cursor().current(), "parser stopped");
    }

    fn ensure_running(&self) -> Result<(), IndexerError> {
        if self.running.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(IndexerError::NotRunning)
        }
    }
}

impl Drop for Parser {
    fn drop(&mut self) {
        if let Some(task) = self.take_task() {
            task.cancel.cancel();
        }
    }
}
