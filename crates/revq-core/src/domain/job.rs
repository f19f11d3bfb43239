//! Review job requests.

use serde::{Deserialize, Serialize};

use crate::domain::error::ReviewError;

/// The inputs one review job runs against.
///
/// A job additionally carries a [`revq_store::JobId`]; together the
/// four values are validated by the pipeline before any upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Repository URL. Owner and repo are the last two path segments.
    pub repo_url: String,

    /// Pull request number within the repository.
    pub pr_number: u64,

    /// Bearer-style API credential for the change source.
    pub credential: String,
}

impl JobRequest {
    pub fn new(repo_url: impl Into<String>, pr_number: u64, credential: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            pr_number,
            credential: credential.into(),
        }
    }

    /// Check that all fields are present. Does not touch the network.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.repo_url.trim().is_empty()
            || self.pr_number == 0
            || self.credential.trim().is_empty()
        {
            return Err(ReviewError::Validation("missing parameters".to_string()));
        }
        Ok(())
    }
}
