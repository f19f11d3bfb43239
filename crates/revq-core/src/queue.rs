//! In-process job queue and worker pool.
//!
//! Submissions go through a bounded mpsc channel into a fixed set of
//! worker tasks that each run jobs to completion through the
//! [`JobRunner`]. The pipeline itself stays queue-agnostic; this
//! module only owns id generation, the `queued` status write, and
//! dispatch.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use revq_store::{JobId, JobStatus, JobStore};

use crate::domain::{JobRequest, ReviewError};
use crate::runner::JobRunner;

#[derive(Debug)]
struct QueuedJob {
    job_id: JobId,
    request: JobRequest,
}

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Number of worker tasks pulling from the queue.
    pub workers: usize,

    /// Bounded channel capacity; `submit` waits when the backlog is full.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            workers: 2,
            capacity: 64,
        }
    }
}

impl QueueConfig {
    /// Create a new config from environment variables
    /// (`REVQ_WORKERS`, `REVQ_QUEUE_CAPACITY`).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let parse = |var: &str, fallback: usize| {
            std::env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        };
        QueueConfig {
            workers: parse("REVQ_WORKERS", defaults.workers),
            capacity: parse("REVQ_QUEUE_CAPACITY", defaults.capacity),
        }
    }
}

/// Handle for submitting jobs to the worker pool.
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
    store: Arc<dyn JobStore>,
    workers: Vec<JoinHandle<()>>,
}

impl JobQueue {
    /// Start the worker pool and return the submission handle.
    pub fn start(runner: Arc<JobRunner>, store: Arc<dyn JobStore>, config: QueueConfig) -> Self {
        let (tx, rx) = mpsc::channel::<QueuedJob>(config.capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let worker_count = config.workers.max(1);
        let mut workers = Vec::with_capacity(worker_count);
        for n in 0..worker_count {
            let rx = rx.clone();
            let runner = runner.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    // Hold the lock only while receiving, so siblings
                    // can pull the next job while this one runs.
                    let job = rx.lock().await.recv().await;
                    match job {
                        Some(job) => {
                            info!(worker = n, job_id = %job.job_id, "picked up job");
                            runner.run(&job.job_id, &job.request).await;
                        }
                        None => break,
                    }
                }
                info!(worker = n, "worker stopped");
            }));
        }

        Self { tx, store, workers }
    }

    /// Submit a review request: generate a job id, record it as
    /// `queued`, and hand it to the pool.
    pub async fn submit(&self, request: JobRequest) -> Result<JobId, ReviewError> {
        let job_id = JobId::new();

        if let Err(e) = self.store.set_status(&job_id, JobStatus::Queued).await {
            warn!(job_id = %job_id, error = %e, "failed to record queued status");
        }

        self.tx
            .send(QueuedJob {
                job_id: job_id.clone(),
                request,
            })
            .await
            .map_err(|_| ReviewError::Internal("job queue is closed".to_string()))?;

        Ok(job_id)
    }

    /// Stop accepting submissions and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{ScriptedChangeSource, ScriptedClassifier};
    use crate::pipeline::{PipelineConfig, ReviewPipeline};
    use crate::source::ChangedFile;
    use revq_store::MemoryJobStore;

    fn queue_with(source: ScriptedChangeSource, workers: usize) -> (JobQueue, Arc<MemoryJobStore>) {
        let store = Arc::new(MemoryJobStore::new());
        let classifier =
            ScriptedClassifier::default().with_default_reply("Style, scripted finding");
        let pipeline = ReviewPipeline::new(
            Arc::new(source),
            Arc::new(classifier),
            PipelineConfig::default(),
        );
        let runner = Arc::new(JobRunner::new(pipeline, store.clone()));
        let queue = JobQueue::start(
            runner,
            store.clone(),
            QueueConfig {
                workers,
                capacity: 8,
            },
        );
        (queue, store)
    }

    fn request() -> JobRequest {
        JobRequest::new("https://github.com/acme/widgets", 7, "token")
    }

    #[tokio::test]
    async fn submitted_job_reaches_terminal_status() {
        let source = ScriptedChangeSource::default().with_file(ChangedFile {
            filename: "src/lib.rs".to_string(),
            patch: Some("@@ -0,0 +1,1 @@\n+let x = 1;".to_string()),
            contents_url: Some("https://api.example/c/src/lib.rs".to_string()),
        });
        let (queue, store) = queue_with(source, 1);

        let job_id = queue.submit(request()).await.unwrap();
        queue.shutdown().await;

        assert_eq!(
            store.get_status(&job_id).await.unwrap(),
            Some(JobStatus::Completed)
        );
        assert!(store.get_result(&job_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn each_submission_gets_a_distinct_job_id() {
        let (queue, _store) = queue_with(ScriptedChangeSource::default(), 2);

        let a = queue.submit(request()).await.unwrap();
        let b = queue.submit(request()).await.unwrap();
        assert_ne!(a, b);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn multiple_jobs_all_terminate() {
        let (queue, store) = queue_with(ScriptedChangeSource::default(), 3);

        let mut ids = Vec::new();
        for _ in 0..10 {
            ids.push(queue.submit(request()).await.unwrap());
        }
        queue.shutdown().await;

        for id in ids {
            let status = store.get_status(&id).await.unwrap().unwrap();
            assert!(status.is_terminal(), "job {id} stuck in {status}");
        }
    }
}
