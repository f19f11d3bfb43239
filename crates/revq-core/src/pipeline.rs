//! Review pipeline orchestration.
//!
//! Drives one job end to end: validate inputs → fetch the changed-file
//! list → parse patches and dispatch lines to the classifier under a
//! bounded fan-out → aggregate into a [`Report`].
//!
//! Failure containment: only parameter validation and an error while
//! listing changed files fail the pipeline. A content-fetch failure
//! drops that file, a classification failure drops that line; siblings
//! always proceed.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use revq_store::JobId;

use crate::classify::Classifier;
use crate::diff::parse_patch;
use crate::domain::{FileReport, Issue, JobRequest, Report, ReviewError};
use crate::source::{ChangeSource, ChangedFile};

/// Phases the pipeline moves through. Terminal outcomes are the `Ok`
/// (done) and `Err` (failed) sides of [`ReviewPipeline::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Started,
    FetchingFiles,
    ParsingAndDispatching,
    Aggregating,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelinePhase::Started => "started",
            PipelinePhase::FetchingFiles => "fetching_files",
            PipelinePhase::ParsingAndDispatching => "parsing_and_dispatching",
            PipelinePhase::Aggregating => "aggregating",
        };
        write!(f, "{name}")
    }
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum concurrent outbound calls per job (content fetches at
    /// the file level, classification calls at the line level).
    pub fan_out: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig { fan_out: 4 }
    }
}

impl PipelineConfig {
    /// Create a new config from environment variables (`REVQ_FAN_OUT`).
    pub fn from_env() -> Self {
        let fan_out = std::env::var("REVQ_FAN_OUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4);
        PipelineConfig { fan_out }
    }
}

/// Orchestrates change source, diff parser, and classifier for one job.
///
/// Queue-agnostic: a pure function of its inputs to a [`Report`], with
/// every external call behind an injected trait.
pub struct ReviewPipeline {
    source: Arc<dyn ChangeSource>,
    classifier: Arc<dyn Classifier>,
    fan_out: usize,
}

impl ReviewPipeline {
    pub fn new(
        source: Arc<dyn ChangeSource>,
        classifier: Arc<dyn Classifier>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            classifier,
            fan_out: config.fan_out.max(1),
        }
    }

    /// Run the pipeline to a terminal outcome.
    ///
    /// `Ok(report)` is the Done state; `Err` is Failed and is reached
    /// only for missing parameters or an unrecoverable error while
    /// listing changed files. An empty-but-successful changed-file
    /// list is Done with an empty report, not a failure.
    pub async fn run(&self, job_id: &JobId, request: &JobRequest) -> Result<Report, ReviewError> {
        info!(job_id = %job_id, phase = %PipelinePhase::Started, "review pipeline starting");
        if job_id.as_str().trim().is_empty() {
            return Err(ReviewError::Validation("missing parameters".to_string()));
        }
        request.validate()?;

        info!(job_id = %job_id, phase = %PipelinePhase::FetchingFiles, "listing changed files");
        let files = self.source.list_changed_files(request).await?;
        if files.is_empty() {
            info!(job_id = %job_id, "no changed files; empty report");
            return Ok(Report::empty());
        }

        let total = files.len();
        let reviewable: Vec<ChangedFile> =
            files.into_iter().filter(|f| f.is_reviewable()).collect();
        info!(
            job_id = %job_id,
            phase = %PipelinePhase::ParsingAndDispatching,
            total,
            reviewable = reviewable.len(),
            "dispatching files"
        );

        // Fan out per file, then restore changed-file list order:
        // completion order must not leak into the report.
        let mut results: Vec<(usize, Option<FileReport>)> =
            stream::iter(reviewable.into_iter().enumerate())
                .map(|(idx, file)| async move { (idx, self.process_file(request, file).await) })
                .buffer_unordered(self.fan_out)
                .collect()
                .await;
        results.sort_by_key(|(idx, _)| *idx);

        info!(job_id = %job_id, phase = %PipelinePhase::Aggregating, "building report");
        let file_reports = results.into_iter().filter_map(|(_, r)| r).collect();
        Ok(Report::from_files(file_reports))
    }

    /// Process one changed file. `None` means the file was dropped
    /// (content fetch failed); the error never crosses the file
    /// boundary.
    async fn process_file(&self, request: &JobRequest, file: ChangedFile) -> Option<FileReport> {
        let contents_url = file.contents_url.as_deref().unwrap_or_default();
        match self
            .source
            .fetch_content(contents_url, &request.credential)
            .await
        {
            Ok(content) => {
                debug!(file = %file.filename, bytes = content.len(), "fetched file content")
            }
            Err(e) => {
                warn!(file = %file.filename, error = %e, "content fetch failed; dropping file");
                return None;
            }
        }

        let changes = parse_patch(file.patch.as_deref().unwrap_or_default());
        debug!(file = %file.filename, added_lines = changes.len(), "parsed patch");

        let filename = file.filename.clone();
        let issues: Vec<Issue> = stream::iter(changes)
            .map(|change| async move {
                let outcome = self.classifier.classify(change.line, &change.content).await;
                (change, outcome)
            })
            // `buffered` keeps line order while bounding concurrency.
            .buffered(self.fan_out)
            .filter_map(|(change, outcome)| {
                let filename = &filename;
                async move {
                    match outcome {
                        Ok(fragment) if fragment.is_usable() => Some(Issue {
                            category: fragment.category,
                            line: change.line,
                            description: fragment.description,
                        }),
                        Ok(fragment) => {
                            debug!(
                                file = %filename,
                                line = change.line,
                                category = %fragment.category,
                                "dropping degraded classification"
                            );
                            None
                        }
                        Err(e) => {
                            warn!(
                                file = %filename,
                                line = change.line,
                                error = %e,
                                "classification failed; dropping line"
                            );
                            None
                        }
                    }
                }
            })
            .collect()
            .await;

        Some(FileReport {
            name: file.filename,
            issues,
        })
    }
}
