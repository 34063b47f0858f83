//! Job queue: bounded worker pool, per-job timeout, retry with backoff.
//!
//! Jobs live in memory. A failed attempt with a recoverable error is requeued
//! after an exponential delay until the attempt ceiling is hit; unrecoverable
//! errors fail the job at once. The dispatcher's terminal hook runs exactly
//! once per job, after which the finished sender (if any) is notified.
//!
//! Shutdown: [`JobQueue::shutdown`] stops the pool from taking new jobs. It does
//! not wait for in-flight jobs or pending retries.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;
use uuid::Uuid;

use pinner_core::{Job, PinnerConfig};

use crate::context::{JobDispatcher, JobStatus};
use crate::error::PipelineError;

/// Upper bound on the delay before a retry.
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(300);

/// Delay before the attempt following `attempts_made` earlier ones: base * 2^n, capped.
#[inline]
pub(crate) fn compute_retry_backoff(base: Duration, attempts_made: u32) -> Duration {
    let factor = 2_u32.saturating_pow(attempts_made);
    base.saturating_mul(factor).min(MAX_RETRY_BACKOFF)
}

/// Notified with each job's id once it reaches a terminal state.
pub type JobFinishedSender = mpsc::Sender<(Uuid, JobStatus)>;

#[derive(Clone, Debug)]
pub struct JobQueueConfig {
    pub max_workers: usize,
    /// Total deliveries per job, first attempt included.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub job_timeout: Duration,
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            job_timeout: Duration::from_secs(1800),
        }
    }
}

impl JobQueueConfig {
    pub fn from_config(config: &PinnerConfig) -> Self {
        Self {
            max_workers: config.worker_concurrency,
            max_attempts: config.job_max_attempts,
            backoff_base: config.job_backoff_base(),
            job_timeout: config.job_timeout(),
        }
    }
}

#[derive(Clone)]
pub struct JobQueue {
    jobs_tx: mpsc::UnboundedSender<Job>,
    shutdown_tx: mpsc::Sender<()>,
}

impl JobQueue {
    /// Start the worker pool. Must be called inside a tokio runtime.
    pub fn new(
        config: JobQueueConfig,
        dispatcher: Arc<dyn JobDispatcher>,
        job_finished_tx: Option<JobFinishedSender>,
    ) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(Self::worker_pool(
            config,
            dispatcher,
            jobs_rx,
            jobs_tx.clone(),
            shutdown_rx,
            job_finished_tx,
        ));

        Self {
            jobs_tx,
            shutdown_tx,
        }
    }

    /// Submit a new job to the queue.
    #[tracing::instrument(skip(self, payload))]
    pub fn submit(&self, job_type: &str, payload: serde_json::Value) -> Result<Uuid> {
        self.enqueue(Job::new(job_type, payload))
    }

    /// Enqueue an already built job, keeping its id and attempt count.
    pub fn enqueue(&self, job: Job) -> Result<Uuid> {
        let id = job.id;
        let job_type = job.job_type.clone();
        self.jobs_tx.send(job).map_err(|_| {
            tracing::error!(job_id = %id, job_type = %job_type, "Job queue is shut down");
            anyhow::anyhow!("Job queue is shut down, cannot accept job {}", id)
        })?;

        tracing::info!(job_id = %id, job_type = %job_type, "Job submitted to queue");
        Ok(id)
    }

    async fn worker_pool(
        config: JobQueueConfig,
        dispatcher: Arc<dyn JobDispatcher>,
        mut jobs_rx: mpsc::UnboundedReceiver<Job>,
        requeue_tx: mpsc::UnboundedSender<Job>,
        mut shutdown_rx: mpsc::Receiver<()>,
        job_finished_tx: Option<JobFinishedSender>,
    ) {
        tracing::info!(
            max_workers = config.max_workers,
            max_attempts = config.max_attempts,
            "Job queue worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Job queue worker pool shutting down");
                    break;
                }
                job = jobs_rx.recv() => {
                    let Some(job) = job else { break };

                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };

                    let dispatcher = dispatcher.clone();
                    let config = config.clone();
                    let requeue_tx = requeue_tx.clone();
                    let finished_tx = job_finished_tx.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        Self::process_job(job, dispatcher, config, requeue_tx, finished_tx).await;
                    });
                }
            }
        }

        tracing::info!("Job queue worker pool stopped");
    }

    #[tracing::instrument(
        skip(job, dispatcher, config, requeue_tx, job_finished_tx),
        fields(job.id = %job.id, job.type = %job.job_type, job.attempt = job.attempts_made + 1)
    )]
    async fn process_job(
        job: Job,
        dispatcher: Arc<dyn JobDispatcher>,
        config: JobQueueConfig,
        requeue_tx: mpsc::UnboundedSender<Job>,
        job_finished_tx: Option<JobFinishedSender>,
    ) {
        let result = tokio::time::timeout(config.job_timeout, dispatcher.dispatch(&job)).await;

        let error = match result {
            Ok(Ok(outcome)) => {
                tracing::info!(outcome = ?outcome, "Job completed successfully");
                Self::finish(
                    &job,
                    JobStatus::Completed,
                    dispatcher.as_ref(),
                    job_finished_tx,
                )
                .await;
                return;
            }
            Ok(Err(e)) => e,
            Err(_) => PipelineError::Timeout(config.job_timeout),
        };

        let attempts_made = job.attempts_made + 1;
        let recoverable = error.is_recoverable();

        tracing::error!(
            error = %error,
            attempts_made = attempts_made,
            max_attempts = config.max_attempts,
            unrecoverable = !recoverable,
            "Job execution failed"
        );

        if recoverable && attempts_made < config.max_attempts {
            let backoff = compute_retry_backoff(config.backoff_base, job.attempts_made);
            tracing::info!(
                backoff_ms = backoff.as_millis() as u64,
                next_attempt = attempts_made + 1,
                "Scheduling job retry"
            );
            let retry = job.next_attempt();
            tokio::spawn(async move {
                sleep(backoff).await;
                if requeue_tx.send(retry).is_err() {
                    tracing::warn!("Job queue shut down before retry could be requeued");
                }
            });
            return;
        }

        if recoverable {
            tracing::error!("Job failed after max attempts");
        } else {
            tracing::error!("Job failed with unrecoverable error, will not retry");
        }
        Self::finish(
            &job,
            JobStatus::Failed,
            dispatcher.as_ref(),
            job_finished_tx,
        )
        .await;
    }

    async fn finish(
        job: &Job,
        status: JobStatus,
        dispatcher: &dyn JobDispatcher,
        job_finished_tx: Option<JobFinishedSender>,
    ) {
        dispatcher.on_terminal(job, status).await;
        if let Some(tx) = job_finished_tx {
            let _ = tx.send((job.id, status)).await;
        }
    }

    /// Signals the worker pool to stop taking jobs and exit its loop.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating job queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }
}
