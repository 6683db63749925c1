//! Main-thread dispatcher — the central algorithm.
//!
//! The real host's scripting API must only ever be touched from its own main
//! thread. Here there is no foreign main thread to hop onto, so the main-thread
//! stand-in is a single dedicated Tokio task that owns the `Host` exclusively and
//! drains a FIFO `mpsc` queue of [`Job`]s. This replaces a poll-wait idiom
//! (~10ms granularity result-carrier polling) with a one-shot channel per
//! call, which is strictly more precise and removes the polling interval
//! while keeping the same guarantees: one carrier per call, FIFO
//! enqueue-order processing, discard-on-timeout, and captured-output transport.

use crate::host::Host;
use crate::persist::PersistStore;
use crate::router::{self, DispatchOutcome, Request};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub struct Job {
    pub request: Request,
    pub source: String,
    pub reply: oneshot::Sender<DispatchOutcome>,
}

#[derive(Clone)]
pub struct DispatcherHandle {
    jobs: mpsc::Sender<Job>,
}

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

impl DispatcherHandle {
    /// Enqueue `request` for main-thread-equivalent execution and await its
    /// result, or time out after `timeout`. On timeout the job is left queued:
    /// the worker eventually runs it and its result is silently discarded, so
    /// a slow host never loses a pending callback, only the reply to it.
    pub async fn dispatch(&self, request: Request, source: String, timeout: Duration) -> DispatchOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = Job {
            request,
            source,
            reply: reply_tx,
        };

        if self.jobs.send(job).await.is_err() {
            return DispatchOutcome {
                envelope: serde_json::json!({"status": "error", "message": "dispatcher is shutting down"}),
                shutdown_requested: false,
            };
        }

        match crate::timeout::with_timeout(timeout, reply_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) | Err(_) => DispatchOutcome {
                envelope: serde_json::json!({"status": "error", "message": "Command execution timeout"}),
                shutdown_requested: false,
            },
        }
    }
}

/// Spawns the host-worker task and returns a handle to send [`Job`]s to it.
/// The worker runs until the handle and all its clones are dropped.
pub fn spawn_host_worker(mut host: Box<dyn Host>, persist: Arc<PersistStore>) -> DispatcherHandle {
    let (tx, mut rx) = mpsc::channel::<Job>(256);

    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let outcome = router::dispatch(job.request, host.as_mut(), &persist, &job.source);
            let _ = job.reply.send(outcome);
        }
    });

    DispatcherHandle { jobs: tx }
}
