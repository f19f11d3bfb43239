//! Storage trait definitions for revq
//!
//! `JobStore` is the key-value surface the job runner writes to and
//! pollers read from. Two logical namespaces, both keyed by job id:
//! - status: one of `queued | processing | completed | failed`
//! - result: the final report, stored as structured JSON
//!
//! Guarantees expected from any implementation:
//! - `set_*` is last-value-wins; no transactional coupling between
//!   the two namespaces.
//! - `get_*` returns `Ok(None)` for unknown job ids, never an error.
//!
//! Callers write the terminal status before (or together with) the
//! result, so a reader never observes a result under a stale status.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Unique identifier for a review job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random JobId
    pub fn new() -> Self {
        JobId(uuid::Uuid::new_v4().to_string())
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

/// Lifecycle status of a review job.
///
/// Transitions are monotonic: Queued → Processing → Completed | Failed.
/// A terminal status is written exactly once and never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse the storage representation back into a status.
    pub fn parse(s: &str) -> StoreResult<Self> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(StoreError::InvalidStatus(other.to_string())),
        }
    }

    /// Whether this status ends the job lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job status/result store.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Write the current status for a job (last-value-wins).
    async fn set_status(&self, job_id: &JobId, status: JobStatus) -> StoreResult<()>;

    /// Read the current status for a job. `None` if the id is unknown.
    async fn get_status(&self, job_id: &JobId) -> StoreResult<Option<JobStatus>>;

    /// Write the result payload for a job (last-value-wins).
    async fn set_result(&self, job_id: &JobId, result: &serde_json::Value) -> StoreResult<()>;

    /// Read the result payload for a job. `None` if no result has been
    /// stored yet (or the id is unknown).
    async fn get_result(&self, job_id: &JobId) -> StoreResult<Option<serde_json::Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_round_trips_through_storage_form() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn job_status_rejects_unknown_string() {
        let err = JobStatus::parse("running").unwrap_err();
        assert!(matches!(err, StoreError::InvalidStatus(_)));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }
}
