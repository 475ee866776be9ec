// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Serializer
//!
//! Single-flight FIFO queue for mutating swap tasks. One worker takes tasks
//! in arrival order and runs each on its own tokio task, waiting at most the
//! task's ceiling before moving on. A task that outlives its ceiling is left
//! running detached: broadcast transactions cannot be recalled, so its effects
//! are reconciled later through the state store rather than by cancellation.
//! Panics are caught through the join handle and never stop the worker.
//!
//! ## Shutdown
//!
//! The worker stops on the shared `CancellationToken`. Tasks still queued at
//! that point resolve to [`TaskFailure::Closed`].

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Why a queued task produced no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskFailure {
    #[error("task exceeded its {0:?} ceiling")]
    TimedOut(Duration),

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("request queue is closed")]
    Closed,
}

type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

struct QueuedTask {
    id: u64,
    ceiling: Duration,
    run: TaskFuture,
    fail: Box<dyn FnOnce(TaskFailure) + Send>,
}

#[derive(Default)]
struct QueueMetrics {
    depth: AtomicUsize,
    busy: AtomicBool,
    next_id: AtomicU64,
}

/// Handle to the serializer. Cheap to clone.
#[derive(Clone)]
pub struct RequestSerializer {
    sender: mpsc::UnboundedSender<QueuedTask>,
    metrics: Arc<QueueMetrics>,
    ceiling: Duration,
}

impl RequestSerializer {
    /// Spawn the worker and return a handle to it.
    ///
    /// `ceiling` is the default time limit for each task.
    pub fn start(ceiling: Duration, shutdown: CancellationToken) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let metrics = Arc::new(QueueMetrics::default());

        tokio::spawn(run_worker(receiver, metrics.clone(), shutdown));

        Self {
            sender,
            metrics,
            ceiling,
        }
    }

    /// Queued plus running tasks.
    pub fn depth(&self) -> usize {
        self.metrics.depth.load(Ordering::SeqCst)
    }

    /// Whether a task is currently running.
    pub fn is_busy(&self) -> bool {
        self.metrics.busy.load(Ordering::SeqCst)
    }

    /// Enqueue `task` with the default ceiling.
    ///
    /// The task is queued immediately; the returned future resolves with its
    /// output once it has run.
    pub fn submit<F, T>(
        &self,
        task: F,
    ) -> impl Future<Output = Result<T, TaskFailure>> + Send + 'static
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.submit_with_ceiling(task, self.ceiling)
    }

    /// Enqueue `task` with its own ceiling.
    pub fn submit_with_ceiling<F, T>(
        &self,
        task: F,
        ceiling: Duration,
    ) -> impl Future<Output = Result<T, TaskFailure>> + Send + 'static
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel::<Result<T, TaskFailure>>();
        let result_tx = Arc::new(Mutex::new(Some(result_tx)));

        let on_done = result_tx.clone();
        let run: TaskFuture = Box::pin(async move {
            let output = task.await;
            if let Some(tx) = take_sender(&on_done) {
                let _ = tx.send(Ok(output));
            }
        });
        let fail = Box::new(move |failure: TaskFailure| {
            if let Some(tx) = take_sender(&result_tx) {
                let _ = tx.send(Err(failure));
            }
        });

        let id = self.metrics.next_id.fetch_add(1, Ordering::SeqCst);
        self.metrics.depth.fetch_add(1, Ordering::SeqCst);
        let queued = QueuedTask {
            id,
            ceiling,
            run,
            fail,
        };
        if let Err(mpsc::error::SendError(task)) = self.sender.send(queued) {
            self.metrics.depth.fetch_sub(1, Ordering::SeqCst);
            (task.fail)(TaskFailure::Closed);
        }

        async move { result_rx.await.unwrap_or(Err(TaskFailure::Closed)) }
    }
}

fn take_sender<T>(slot: &Mutex<Option<oneshot::Sender<T>>>) -> Option<oneshot::Sender<T>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<QueuedTask>,
    metrics: Arc<QueueMetrics>,
    shutdown: CancellationToken,
) {
    info!("Request serializer starting");

    loop {
        let task = tokio::select! {
            _ = shutdown.cancelled() => break,
            task = receiver.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        metrics.busy.store(true, Ordering::SeqCst);
        debug!(task_id = task.id, "Running queued task");

        let QueuedTask {
            id,
            ceiling,
            run,
            fail,
        } = task;
        let handle = tokio::spawn(run);

        // Dropping the handle on timeout detaches the task without aborting it.
        match tokio::time::timeout(ceiling, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(join_error)) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    "task cancelled".to_string()
                };
                error!(task_id = id, error = %message, "Queued task panicked");
                fail(TaskFailure::Panicked(message));
            }
            Err(_) => {
                error!(
                    task_id = id,
                    ceiling_secs = ceiling.as_secs_f64(),
                    "Queued task exceeded its ceiling, releasing the queue while it keeps running"
                );
                fail(TaskFailure::TimedOut(ceiling));
            }
        }

        metrics.busy.store(false, Ordering::SeqCst);
        metrics.depth.fetch_sub(1, Ordering::SeqCst);
    }

    // Fail whatever is still queued.
    receiver.close();
    while let Ok(task) = receiver.try_recv() {
        metrics.depth.fetch_sub(1, Ordering::SeqCst);
        (task.fail)(TaskFailure::Closed);
    }
    info!("Request serializer shutting down");
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
