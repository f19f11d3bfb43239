//! Report types: what a completed review job stores.
//!
//! All types are `Serialize`/`Deserialize`; the stored result payload
//! is the JSON form of [`StoredResult`].

use serde::{Deserialize, Serialize};

use revq_store::{JobId, JobStatus};

/// One added line extracted from a unified-diff patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChange {
    /// 1-based line number in the new version of the file.
    pub line: u32,

    /// Added source text, leading `+` stripped and whitespace-trimmed.
    pub content: String,
}

/// A classified finding on one added line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Single-word label (e.g. `Bug`, `Style`, `Improvement`, `Best Practice`).
    pub category: String,

    /// Line number of the [`LineChange`] this issue was derived from.
    pub line: u32,

    /// Short free-text description.
    pub description: String,
}

/// Issues for one changed file, in the order its lines were processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// Repository-relative filename.
    pub name: String,

    /// Ordered findings for this file. May be empty.
    pub issues: Vec<Issue>,
}

/// Aggregate counts across all file reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_files: usize,
    pub total_issues: usize,
    /// Reserved for a future severity policy. Always 0.
    pub critical_issues: usize,
}

/// The result payload of a review job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Per-file findings, in changed-file list order.
    pub files: Vec<FileReport>,

    /// Aggregate counts. `total_issues` always equals the sum of
    /// per-file issue counts.
    pub summary: Summary,

    /// Error description for failed jobs. Absent on success, so
    /// callers never special-case the failure shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// A valid terminal report for a PR with no changed files.
    pub fn empty() -> Self {
        Self::from_files(Vec::new())
    }

    /// Build a report from per-file results, computing the summary.
    pub fn from_files(files: Vec<FileReport>) -> Self {
        let total_issues = files.iter().map(|f| f.issues.len()).sum();
        let summary = Summary {
            total_files: files.len(),
            total_issues,
            critical_issues: 0,
        };
        Report {
            files,
            summary,
            error: None,
        }
    }

    /// A zero-count report carrying a failure description. Same shape
    /// as a successful report, plus the `error` field.
    pub fn failure(message: impl Into<String>) -> Self {
        let mut report = Report::empty();
        report.error = Some(message.into());
        report
    }
}

/// Envelope written to the result namespace of the job store.
///
/// Self-describing: a result read alone tells the caller which job it
/// belongs to and how the job ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResult {
    pub job_id: String,
    pub status: JobStatus,
    pub report: Report,
}

impl StoredResult {
    pub fn new(job_id: &JobId, status: JobStatus, report: Report) -> Self {
        Self {
            job_id: job_id.to_string(),
            status,
            report,
        }
    }
}
