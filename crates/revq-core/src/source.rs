//! Change source: where a PR's changed files come from.
//!
//! `ChangeSource` is the injected seam the pipeline fetches through;
//! `GitHubChangeSource` is the real implementation over the GitHub
//! REST API. No retries happen here — retry policy belongs to the
//! caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::{JobRequest, ReviewError};

/// One entry of the changed-files list for a PR.
///
/// `patch` is absent for binary files, oversized diffs, and renames
/// without content changes; such files never reach the diff parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative filename.
    pub filename: String,

    /// Unified-diff hunk text for this file, when available.
    #[serde(default)]
    pub patch: Option<String>,

    /// Reference for fetching the file's raw content.
    #[serde(default)]
    pub contents_url: Option<String>,
}

impl ChangedFile {
    /// Whether this file can be processed at all: it needs both a
    /// patch to parse and a content reference to fetch.
    pub fn is_reviewable(&self) -> bool {
        self.patch.as_deref().is_some_and(|p| !p.is_empty())
            && self.contents_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Source of changed files and raw file content for a PR.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// List the files changed in the request's pull request.
    async fn list_changed_files(
        &self,
        request: &JobRequest,
    ) -> Result<Vec<ChangedFile>, ReviewError>;

    /// Fetch the raw content behind a content reference.
    async fn fetch_content(&self, url: &str, credential: &str) -> Result<String, ReviewError>;
}

/// Configuration for the GitHub change source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API base URL. Overridable so tests can point at a local stub.
    pub api_base: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_base: std::env::var("GITHUB_API_BASE")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            timeout_secs: 30,
        }
    }
}

impl GithubConfig {
    /// Create a new config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API base.
    pub fn new(api_base: &str) -> Self {
        GithubConfig {
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout_secs: 30,
        }
    }
}

/// Derive (owner, repo) from a repository URL: the last two path
/// segments after trimming trailing slashes. Fewer than two segments
/// is a validation failure, raised before any network call.
pub fn parse_repo_reference(repo_url: &str) -> Result<(String, String), ReviewError> {
    // The host is not a path segment: strip `scheme://host` first.
    let path = match repo_url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => repo_url,
    };

    let mut segments = path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .rev();

    let repo = segments.next();
    let owner = segments.next();
    match (owner, repo) {
        (Some(owner), Some(repo)) => Ok((owner.to_string(), repo.to_string())),
        _ => Err(ReviewError::Validation(format!(
            "invalid repository reference: {repo_url}"
        ))),
    }
}

/// GitHub REST implementation of [`ChangeSource`].
pub struct GitHubChangeSource {
    config: GithubConfig,
    http_client: reqwest::Client,
}

impl GitHubChangeSource {
    /// Create a new GitHub change source.
    pub fn new(config: GithubConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("revq/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        GitHubChangeSource {
            config,
            http_client,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(GithubConfig::from_env())
    }
}

#[async_trait]
impl ChangeSource for GitHubChangeSource {
    async fn list_changed_files(
        &self,
        request: &JobRequest,
    ) -> Result<Vec<ChangedFile>, ReviewError> {
        let (owner, repo) = parse_repo_reference(&request.repo_url)?;
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.config.api_base.trim_end_matches('/'),
            owner,
            repo,
            request.pr_number
        );

        debug!(%url, "listing changed files");
        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("token {}", request.credential))
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(ReviewError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReviewError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Vec<ChangedFile>>()
            .await
            .map_err(ReviewError::from_reqwest)
    }

    async fn fetch_content(&self, url: &str, credential: &str) -> Result<String, ReviewError> {
        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("token {credential}"))
            .header("Accept", "application/vnd.github.v3.raw")
            .send()
            .await
            .map_err(ReviewError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReviewError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response.text().await.map_err(ReviewError::from_reqwest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_and_repo_from_https_url() {
        let (owner, repo) = parse_repo_reference("https://github.com/acme/widgets").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "widgets");
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let (owner, repo) = parse_repo_reference("https://github.com/acme/widgets///").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "widgets");
    }

    #[test]
    fn single_segment_reference_is_rejected() {
        let err = parse_repo_reference("https://host.example/only-one-segment").unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
    }

    #[test]
    fn scheme_less_reference_is_accepted() {
        let (owner, repo) = parse_repo_reference("github.com/acme/widgets").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "widgets");
    }

    #[test]
    fn bare_host_is_rejected() {
        assert!(parse_repo_reference("https://github.com").is_err());
        assert!(parse_repo_reference("").is_err());
    }

    #[test]
    fn reviewable_requires_patch_and_contents_url() {
        let full = ChangedFile {
            filename: "src/lib.rs".to_string(),
            patch: Some("@@ -0,0 +1,1 @@\n+x".to_string()),
            contents_url: Some("https://api.example/contents/src/lib.rs".to_string()),
        };
        assert!(full.is_reviewable());

        let binary = ChangedFile {
            filename: "logo.png".to_string(),
            patch: None,
            contents_url: Some("https://api.example/contents/logo.png".to_string()),
        };
        assert!(!binary.is_reviewable());

        let no_ref = ChangedFile {
            filename: "gone.rs".to_string(),
            patch: Some("@@ -0,0 +1,1 @@\n+x".to_string()),
            contents_url: None,
        };
        assert!(!no_ref.is_reviewable());
    }

    #[test]
    fn changed_file_deserializes_without_optional_fields() {
        let json = r#"{"filename": "logo.png"}"#;
        let file: ChangedFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.filename, "logo.png");
        assert!(file.patch.is_none());
        assert!(file.contents_url.is_none());
    }
}
