//! Ordered import map ingestion queue
//!
//! Merges are applied by a single worker task in the order they were enqueued.
//! Payloads (inline text or fetches) start running the moment they are
//! enqueued and may finish in any order; the worker only ever awaits the
//! payload at the head of the queue.
//!
//! The first failure poisons the queue: every task enqueued after the failed
//! one is skipped without its payload being parsed or merged, and every
//! completion future covering the failed task resolves to that failure.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::IngestError;
use crate::import_map::{ImportMapStore, MapPayload};

/// Payload future handed to [`IngestionQueue::enqueue`]
pub type PayloadFuture = BoxFuture<'static, Result<MapPayload, IngestError>>;

/// Counters describing the queue so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks ever enqueued
    pub enqueued: u64,
    /// Tasks that reached the store
    pub applied: u64,
    /// Tasks never attempted because the queue was already poisoned
    pub skipped: u64,
    /// Whether a task has failed
    pub poisoned: bool,
}

/// State published by the worker after each task
#[derive(Debug, Clone, Default)]
struct ChainState {
    /// Sequence number of the last task attempted or skipped
    settled: u64,
    applied: u64,
    skipped: u64,
    /// First failure and the task it belongs to
    failure: Option<(u64, IngestError)>,
}

impl ChainState {
    /// Outcome of the chain as seen by a completion future taken at `seq`
    fn outcome_at(&self, seq: u64) -> Result<(), IngestError> {
        match &self.failure {
            Some((failed_seq, err)) if *failed_seq <= seq => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

struct QueuedMerge {
    seq: u64,
    map_url: Url,
    payload: JoinHandle<Result<MapPayload, IngestError>>,
}

struct QueueTail {
    last_seq: u64,
    sender: mpsc::UnboundedSender<QueuedMerge>,
}

struct QueueInner {
    handle: Handle,
    tail: Mutex<QueueTail>,
    state: watch::Receiver<ChainState>,
}

/// Handle to the ingestion queue (cheap to clone)
#[derive(Clone)]
pub struct IngestionQueue {
    inner: Arc<QueueInner>,
}

impl IngestionQueue {
    /// Create the queue on the current runtime
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime; use [`IngestionQueue::with_handle`] there.
    pub fn new(store: ImportMapStore) -> Self {
        Self::with_handle(store, Handle::current())
    }

    /// Create the queue with its worker and payloads running on `handle`
    ///
    /// The queue can then be used from any thread.
    pub fn with_handle(store: ImportMapStore, handle: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChainState::default());

        handle.spawn(run_worker(store, receiver, state_tx));

        Self {
            inner: Arc::new(QueueInner {
                handle,
                tail: Mutex::new(QueueTail {
                    last_seq: 0,
                    sender,
                }),
                state: state_rx,
            }),
        }
    }

    /// Runtime the queue spawns onto
    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    fn tail(&self) -> std::sync::MutexGuard<'_, QueueTail> {
        self.inner.tail.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a merge of `payload` with `map_url` as merge context
    ///
    /// The payload future is spawned immediately. Returns the task's sequence
    /// number; tasks are applied in sequence order.
    pub fn enqueue<F>(&self, map_url: Url, payload: F) -> u64
    where
        F: Future<Output = Result<MapPayload, IngestError>> + Send + 'static,
    {
        let payload = self.inner.handle.spawn(payload);

        let mut tail = self.tail();
        tail.last_seq += 1;
        let seq = tail.last_seq;
        debug!("Enqueued import map #{} from {}", seq, map_url);

        if tail
            .sender
            .send(QueuedMerge {
                seq,
                map_url,
                payload,
            })
            .is_err()
        {
            warn!("Import map queue worker is gone, task #{} will never run", seq);
        }
        seq
    }

    /// Sequence number of the most recently enqueued task (0 if none)
    pub fn last_enqueued(&self) -> u64 {
        self.tail().last_seq
    }

    /// Completion of every task enqueued so far
    ///
    /// Tasks enqueued after this call are not waited for. Resolves to the
    /// queue's first failure if that failure is among the covered tasks.
    pub fn settled(&self) -> impl Future<Output = Result<(), IngestError>> + Send + 'static {
        let target = self.last_enqueued();
        let mut state = self.inner.state.clone();
        async move {
            let chain = state
                .wait_for(|s| s.settled >= target)
                .await
                .map_err(|_| IngestError::QueueClosed)?;
            chain.outcome_at(target)
        }
    }

    /// Whether a task has failed
    pub fn is_poisoned(&self) -> bool {
        self.inner.state.borrow().failure.is_some()
    }

    /// The failure that poisoned the queue, if any
    pub fn failure(&self) -> Option<IngestError> {
        self.inner
            .state
            .borrow()
            .failure
            .as_ref()
            .map(|(_, err)| err.clone())
    }

    pub fn stats(&self) -> QueueStats {
        let enqueued = self.last_enqueued();
        let state = self.inner.state.borrow();
        QueueStats {
            enqueued,
            applied: state.applied,
            skipped: state.skipped,
            poisoned: state.failure.is_some(),
        }
    }
}

impl std::fmt::Debug for IngestionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionQueue")
            .field("stats", &self.stats())
            .finish()
    }
}

async fn apply_task(store: &ImportMapStore, task: QueuedMerge) -> Result<(), IngestError> {
    let payload = task
        .payload
        .await
        .map_err(|e| IngestError::FetchFailed {
            url: task.map_url.to_string(),
            reason: format!("payload task failed: {}", e),
        })??;
    store.apply(payload, &task.map_url)
}

async fn run_worker(
    store: ImportMapStore,
    mut receiver: mpsc::UnboundedReceiver<QueuedMerge>,
    state: watch::Sender<ChainState>,
) {
    let mut failure: Option<(u64, IngestError)> = None;

    while let Some(task) = receiver.recv().await {
        let seq = task.seq;

        if let Some((failed_seq, _)) = &failure {
            // the payload task keeps running detached; its result is never read
            debug!(
                "Skipping import map #{} from {}: queue poisoned by #{}",
                seq, task.map_url, failed_seq
            );
            state.send_modify(|s| {
                s.settled = seq;
                s.skipped += 1;
            });
            continue;
        }

        let map_url = task.map_url.clone();
        match apply_task(&store, task).await {
            Ok(()) => {
                info!("Applied import map #{} from {}", seq, map_url);
                state.send_modify(|s| {
                    s.settled = seq;
                    s.applied += 1;
                });
            }
            Err(err) => {
                warn!("Import map #{} from {} failed: {}", seq, map_url, err);
                failure = Some((seq, err.clone()));
                state.send_modify(|s| {
                    s.settled = seq;
                    s.failure = Some((seq, err));
                });
            }
        }
    }

    debug!("Import map queue worker stopped");
}
