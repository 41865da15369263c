#![warn(missing_docs)]
//! Off-thread tokenization for `mdedit-core`.
//!
//! [`TokenizeWorker`] owns one named thread that receives [`TokenizeBatch`]es and answers with
//! [`TokenizeResult`]s over `crossbeam-channel`. The worker shares no state with the editor;
//! each batch carries copies of its lines and the context to start from.
//!
//! Before each pass the worker drains its queue. Only batches stamped with the newest queued
//! version are parsed; older ones would be rejected by the editor anyway.
//!
//! ```no_run
//! use mdedit_core::{EditorConfig, EditorSession};
//! use mdedit_core_worker::TokenizeWorker;
//! use std::time::Duration;
//!
//! let mut session = EditorSession::from_text("# big\ndocument", EditorConfig::default());
//! let worker = TokenizeWorker::spawn()?;
//!
//! worker.submit(session.background_batch(0..2))?;
//! let result = worker.recv_timeout(Duration::from_secs(1))?;
//! session.apply_background_result(result);
//! # Ok::<(), mdedit_core_worker::WorkerError>(())
//! ```

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use mdedit_core::{TokenizeBatch, TokenizeResult};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Name of the worker thread.
pub const THREAD_NAME: &str = "mdedit-tokenize";

/// Worker failures.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to spawn tokenize worker: {0}")]
    /// The OS refused to create the thread.
    Spawn(#[from] std::io::Error),

    #[error("tokenize worker disconnected")]
    /// The worker thread is gone.
    Disconnected,

    #[error("timed out waiting for tokenize result")]
    /// No result arrived in time.
    Timeout,
}

/// Handle to the background tokenization thread.
///
/// Dropping the handle closes the request channel and joins the thread.
#[derive(Debug)]
pub struct TokenizeWorker {
    tx: Option<Sender<TokenizeBatch>>,
    rx: Receiver<TokenizeResult>,
    handle: Option<JoinHandle<()>>,
}

impl TokenizeWorker {
    /// Spawn the worker thread.
    pub fn spawn() -> Result<Self, WorkerError> {
        let (tx, rx_cmd) = crossbeam_channel::unbounded::<TokenizeBatch>();
        let (tx_evt, rx_evt) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(&rx_cmd, &tx_evt))?;
        tracing::debug!(target: "mdedit_core_worker", "tokenize worker started");

        Ok(Self {
            tx: Some(tx),
            rx: rx_evt,
            handle: Some(handle),
        })
    }

    /// Queue a batch.
    pub fn submit(&self, batch: TokenizeBatch) -> Result<(), WorkerError> {
        let tx = self.tx.as_ref().ok_or(WorkerError::Disconnected)?;
        tx.send(batch).map_err(|_| WorkerError::Disconnected)
    }

    /// A finished result, if one is ready.
    pub fn try_recv(&self) -> Result<Option<TokenizeResult>, WorkerError> {
        match self.rx.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Disconnected),
        }
    }

    /// Wait up to `timeout` for a result.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<TokenizeResult, WorkerError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => WorkerError::Timeout,
            RecvTimeoutError::Disconnected => WorkerError::Disconnected,
        })
    }

    /// Result channel, for use with `crossbeam_channel::select!`.
    pub fn results(&self) -> &Receiver<TokenizeResult> {
        &self.rx
    }

    /// Close the request channel and wait for the thread to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::debug!(target: "mdedit_core_worker", "tokenize worker panicked");
        }
    }
}

impl Drop for TokenizeWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(requests: &Receiver<TokenizeBatch>, results: &Sender<TokenizeResult>) {
    for first in requests.iter() {
        for batch in coalesce(first, requests) {
            let lines = batch.len();
            let result = batch.run();
            tracing::trace!(
                target: "mdedit_core_worker",
                version = result.version,
                start_line = batch.start_line,
                lines,
                "tokenized batch"
            );
            if results.send(result).is_err() {
                tracing::debug!(target: "mdedit_core_worker", "result receiver dropped");
                return;
            }
        }
    }
    tracing::debug!(target: "mdedit_core_worker", "tokenize worker stopped");
}

/// `first` plus everything already queued, keeping only batches of the newest version.
fn coalesce(first: TokenizeBatch, requests: &Receiver<TokenizeBatch>) -> Vec<TokenizeBatch> {
    let mut pending = vec![first];
    while let Ok(next) = requests.try_recv() {
        pending.push(next);
    }
    let newest = pending.iter().map(|batch| batch.version).max().unwrap_or(0);
    let queued = pending.len();
    pending.retain(|batch| batch.version == newest);
    if pending.len() < queued {
        tracing::trace!(
            target: "mdedit_core_worker",
            dropped = queued - pending.len(),
            newest,
            "skipped stale batches"
        );
    }
    pending
}
