//! Job runner: status transitions around one pipeline execution.
//!
//! The runner owns the job lifecycle writes: `processing` on entry,
//! then exactly one terminal transition (`completed` or `failed`) with
//! the result stored under it. A job is never left in `processing`,
//! even if the pipeline panics.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

use revq_store::{JobId, JobStatus, JobStore};

use crate::domain::{JobRequest, Report, StoredResult};
use crate::pipeline::ReviewPipeline;

/// Executes one review job against the store.
pub struct JobRunner {
    pipeline: ReviewPipeline,
    store: Arc<dyn JobStore>,
}

impl JobRunner {
    pub fn new(pipeline: ReviewPipeline, store: Arc<dyn JobStore>) -> Self {
        Self { pipeline, store }
    }

    /// Run a job to its terminal status.
    ///
    /// Store write failures are logged and swallowed: a broken store
    /// must not take the worker down, and the pipeline outcome is
    /// already decided by then.
    pub async fn run(&self, job_id: &JobId, request: &JobRequest) {
        self.write_status(job_id, JobStatus::Processing).await;

        let outcome = AssertUnwindSafe(self.pipeline.run(job_id, request))
            .catch_unwind()
            .await;

        let (status, report) = match outcome {
            Ok(Ok(report)) => {
                info!(
                    job_id = %job_id,
                    files = report.summary.total_files,
                    issues = report.summary.total_issues,
                    "review completed"
                );
                (JobStatus::Completed, report)
            }
            Ok(Err(e)) => {
                warn!(job_id = %job_id, error = %e, "review failed");
                (JobStatus::Failed, Report::failure(e.to_string()))
            }
            Err(_) => {
                error!(job_id = %job_id, "review panicked");
                (
                    JobStatus::Failed,
                    Report::failure("internal error".to_string()),
                )
            }
        };

        // Terminal status first, then the result: a reader must never
        // observe a result under a stale status.
        self.write_status(job_id, status).await;
        let stored = StoredResult::new(job_id, status, report);
        match serde_json::to_value(&stored) {
            Ok(payload) => {
                if let Err(e) = self.store.set_result(job_id, &payload).await {
                    error!(job_id = %job_id, error = %e, "failed to store job result");
                }
            }
            Err(e) => error!(job_id = %job_id, error = %e, "failed to serialize job result"),
        }
    }

    async fn write_status(&self, job_id: &JobId, status: JobStatus) {
        if let Err(e) = self.store.set_status(job_id, status).await {
            error!(job_id = %job_id, status = %status, error = %e, "failed to store job status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classifier, IssueFragment};
    use crate::domain::ReviewError;
    use crate::fakes::{ScriptedChangeSource, ScriptedClassifier};
    use crate::pipeline::PipelineConfig;
    use crate::source::ChangedFile;
    use async_trait::async_trait;
    use revq_store::MemoryJobStore;

    fn runner_with(
        source: ScriptedChangeSource,
        classifier: impl Classifier + 'static,
    ) -> (JobRunner, Arc<MemoryJobStore>) {
        let store = Arc::new(MemoryJobStore::new());
        let pipeline = ReviewPipeline::new(
            Arc::new(source),
            Arc::new(classifier),
            PipelineConfig::default(),
        );
        (JobRunner::new(pipeline, store.clone()), store)
    }

    fn request() -> JobRequest {
        JobRequest::new("https://github.com/acme/widgets", 7, "token")
    }

    async fn stored_result(store: &MemoryJobStore, job_id: &JobId) -> StoredResult {
        let payload = store.get_result(job_id).await.unwrap().unwrap();
        serde_json::from_value(payload).unwrap()
    }

    #[tokio::test]
    async fn successful_job_ends_completed_with_report() {
        let source = ScriptedChangeSource::default().with_file(ChangedFile {
            filename: "src/lib.rs".to_string(),
            patch: Some("@@ -0,0 +1,1 @@\n+let x = 1;".to_string()),
            contents_url: Some("https://api.example/c/src/lib.rs".to_string()),
        });
        let classifier =
            ScriptedClassifier::default().with_reply("let x = 1;", "Style, name could be clearer");
        let (runner, store) = runner_with(source, classifier);

        let job_id = JobId::new();
        runner.run(&job_id, &request()).await;

        assert_eq!(
            store.get_status(&job_id).await.unwrap(),
            Some(JobStatus::Completed)
        );
        let stored = stored_result(&store, &job_id).await;
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.report.summary.total_issues, 1);
        assert!(stored.report.error.is_none());
    }

    #[tokio::test]
    async fn empty_pr_ends_completed_with_empty_report() {
        let (runner, store) = runner_with(
            ScriptedChangeSource::default(),
            ScriptedClassifier::default(),
        );

        let job_id = JobId::new();
        runner.run(&job_id, &request()).await;

        assert_eq!(
            store.get_status(&job_id).await.unwrap(),
            Some(JobStatus::Completed)
        );
        let stored = stored_result(&store, &job_id).await;
        assert_eq!(stored.report.summary.total_files, 0);
    }

    #[tokio::test]
    async fn upstream_404_on_list_ends_failed_with_error_report() {
        let (runner, store) = runner_with(
            ScriptedChangeSource::failing_list(404),
            ScriptedClassifier::default(),
        );

        let job_id = JobId::new();
        runner.run(&job_id, &request()).await;

        assert_eq!(
            store.get_status(&job_id).await.unwrap(),
            Some(JobStatus::Failed)
        );
        let stored = stored_result(&store, &job_id).await;
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.report.summary.total_files, 0);
        assert_eq!(stored.report.summary.total_issues, 0);
        assert!(stored.report.error.as_deref().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn validation_failure_ends_failed() {
        let (runner, store) = runner_with(
            ScriptedChangeSource::default(),
            ScriptedClassifier::default(),
        );

        let job_id = JobId::new();
        runner
            .run(&job_id, &JobRequest::new("", 0, ""))
            .await;

        assert_eq!(
            store.get_status(&job_id).await.unwrap(),
            Some(JobStatus::Failed)
        );
        let stored = stored_result(&store, &job_id).await;
        assert!(stored
            .report
            .error
            .as_deref()
            .unwrap()
            .contains("missing parameters"));
    }

    struct PanickingClassifier;

    #[async_trait]
    impl Classifier for PanickingClassifier {
        async fn classify(&self, _line: u32, _snippet: &str) -> Result<IssueFragment, ReviewError> {
            panic!("scripted panic");
        }
    }

    #[tokio::test]
    async fn panic_in_pipeline_still_reaches_terminal_failed() {
        let source = ScriptedChangeSource::default().with_file(ChangedFile {
            filename: "src/lib.rs".to_string(),
            patch: Some("@@ -0,0 +1,1 @@\n+boom".to_string()),
            contents_url: Some("https://api.example/c/src/lib.rs".to_string()),
        });
        let (runner, store) = runner_with(source, PanickingClassifier);

        let job_id = JobId::new();
        runner.run(&job_id, &request()).await;

        assert_eq!(
            store.get_status(&job_id).await.unwrap(),
            Some(JobStatus::Failed)
        );
        let stored = stored_result(&store, &job_id).await;
        assert_eq!(stored.report.error.as_deref(), Some("internal error"));
    }
}
