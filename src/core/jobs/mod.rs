//! Cancellable background-job abstraction.
//!
//! Every long operation (probe, extract, waveform, detect, render) runs
//! through the [`JobRunner`]: a semaphore-bounded worker pool of tokio
//! tasks. Each job receives a [`JobContext`] for progress reporting and
//! cooperative cancellation; callers hold a [`JobHandle`] exposing a
//! multi-subscriber progress channel, a one-shot result, and `cancel()`.
//!
//! The runner retains an entry for every in-flight job until its result
//! has been delivered, so callback targets cannot be dropped while a job
//! is still running.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use log::{debug, trace};
use tokio::sync::{broadcast, oneshot, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::AutoCutError;
use crate::Result;

/// One progress delivery on a job's channel.
///
/// Deliveries are totally ordered per job; no ordering holds across jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Completion percentage, clamped to 0..=100.
    pub percent: f32,
    /// Short human-oriented status line.
    pub message: String,
}

/// Handed to a job body: progress reporting plus the cancellation check.
#[derive(Clone)]
pub struct JobContext {
    progress_tx: Option<broadcast::Sender<ProgressUpdate>>,
    cancel: CancellationToken,
}

impl JobContext {
    /// A context with no subscribers and no cancellation source.
    ///
    /// Lets pipeline code run synchronously (tests, one-shot CLI paths)
    /// without a runner.
    pub fn standalone() -> Self {
        Self {
            progress_tx: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Report progress to every subscriber.
    ///
    /// Lagging or absent subscribers never block the job.
    pub fn report(&self, percent: f32, message: &str) {
        trace!("progress {:.1}%: {}", percent, message);
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(ProgressUpdate {
                percent: percent.clamp(0.0, 100.0),
                message: message.to_string(),
            });
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Checkpoint helper: error out of the job when cancelled.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AutoCutError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// The underlying token, for wiring into child processes.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Caller-side handle to a submitted job.
pub struct JobHandle<T> {
    job_id: String,
    progress_tx: broadcast::Sender<ProgressUpdate>,
    result_rx: oneshot::Receiver<Result<T>>,
    cancel: CancellationToken,
}

impl<T> JobHandle<T> {
    /// Opaque job identifier.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Subscribe to the progress channel.
    ///
    /// Every subscriber sees the same totally-ordered sequence of updates.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.progress_tx.subscribe()
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        debug!("Cancelling job {}", self.job_id);
        self.cancel.cancel();
    }

    /// A clone of the cancellation token, for signal handlers that
    /// outlive the handle.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Await the job result. Resolves exactly once.
    pub async fn wait(self) -> Result<T> {
        self.result_rx
            .await
            .map_err(|_| AutoCutError::JobExecution("job result channel closed".to_string()))?
    }
}

struct ActiveJob {
    job_type: &'static str,
    handle: Option<JoinHandle<()>>,
}

/// Semaphore-bounded runner for background jobs.
pub struct JobRunner {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    active_jobs: Arc<Mutex<HashMap<String, ActiveJob>>>,
}

impl JobRunner {
    /// Create a runner with the given concurrency limit.
    ///
    /// The limit is clamped to the machine's logical CPU count.
    pub fn new(max_concurrent: usize) -> Self {
        let max = max_concurrent.clamp(1, num_cpus::get());
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max_concurrent: max,
            active_jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a runner sized to the machine.
    pub fn with_defaults() -> Self {
        Self::new(num_cpus::get())
    }

    /// The effective concurrency limit.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of jobs whose results have not yet been delivered.
    pub fn active_count(&self) -> usize {
        self.active_jobs.lock().unwrap().len()
    }

    /// Submit a job for background execution.
    ///
    /// The closure receives a [`JobContext`] and runs on the worker pool
    /// once a slot frees up. Cancellation before a slot is acquired
    /// resolves the job with [`AutoCutError::Cancelled`] without running
    /// the body.
    pub fn submit<F, Fut, T>(&self, job_type: &'static str, f: F) -> JobHandle<T>
    where
        F: FnOnce(JobContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let job_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        let (progress_tx, _) = broadcast::channel(256);
        let (result_tx, result_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let ctx = JobContext {
            progress_tx: Some(progress_tx.clone()),
            cancel: cancel.clone(),
        };

        debug!("Submitting {} job {}", job_type, job_id);
        self.active_jobs.lock().unwrap().insert(
            job_id.clone(),
            ActiveJob {
                job_type,
                handle: None,
            },
        );

        let semaphore = Arc::clone(&self.semaphore);
        let active_jobs = Arc::clone(&self.active_jobs);
        let queue_cancel = cancel.clone();
        let task_id = job_id.clone();
        let task = tokio::spawn(async move {
            let result = tokio::select! {
                _ = queue_cancel.cancelled() => Err(AutoCutError::Cancelled),
                permit = semaphore.acquire_owned() => {
                    let _permit = permit.expect("job semaphore never closes");
                    f(ctx).await
                }
            };
            // Deliver before dropping the retention entry.
            let _ = result_tx.send(result);
            active_jobs.lock().unwrap().remove(&task_id);
            trace!("Job {} delivered and released", task_id);
        });

        if let Some(job) = self.active_jobs.lock().unwrap().get_mut(&job_id) {
            job.handle = Some(task);
        }

        JobHandle {
            job_id,
            progress_tx,
            result_rx,
            cancel,
        }
    }

    /// Abort every in-flight job without waiting for delivery.
    ///
    /// Waiters observe a closed result channel; partial outputs are the
    /// responsibility of each job's own guards.
    pub fn abort_all(&self) {
        for job in self.active_jobs.lock().unwrap().values() {
            if let Some(handle) = &job.handle {
                handle.abort();
            }
        }
    }

    /// Job types currently retained, for diagnostics.
    pub fn active_job_types(&self) -> Vec<&'static str> {
        self.active_jobs
            .lock()
            .unwrap()
            .values()
            .map(|j| j.job_type)
            .collect()
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::with_defaults()
    }
}
