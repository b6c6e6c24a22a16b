//! Fan-out Worker
//!
//! Request handlers hand jobs to a bounded channel and return immediately.
//! The worker spawns a task per job, so a job that has started keeps running
//! even if the request that produced it is cancelled.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::fanout::{FanoutEngine, FanoutJob};

/// Jobs that may wait in the queue before submissions are dropped
pub const FANOUT_QUEUE_CAPACITY: usize = 1024;

/// Cloneable submit side of the fan-out queue
#[derive(Clone)]
pub struct FanoutHandle {
    tx: mpsc::Sender<FanoutJob>,
}

impl FanoutHandle {
    /// Queue a job without waiting; returns false if it was dropped
    pub fn submit(&self, job: FanoutJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                tracing::warn!("Fan-out queue full, dropping job: {}", job);
                false
            }
            Err(TrySendError::Closed(job)) => {
                tracing::error!("Fan-out worker stopped, dropping job: {}", job);
                false
            }
        }
    }
}

/// Start the worker; it exits once every handle is dropped
pub fn spawn_fanout_worker(engine: FanoutEngine, capacity: usize) -> (FanoutHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<FanoutJob>(capacity.max(1));

    let worker = tokio::spawn(async move {
        tracing::info!("Fan-out worker started");
        while let Some(job) = rx.recv().await {
            let engine = engine.clone();
            tokio::spawn(async move {
                let report = engine.run(job).await;
                tracing::debug!("Fan-out finished: {:?}", report);
            });
        }
        tracing::info!("Fan-out worker stopped");
    });

    (FanoutHandle { tx }, worker)
}
