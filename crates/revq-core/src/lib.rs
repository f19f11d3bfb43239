//! revq Core Library
//!
//! Turns a (repository URL, PR number, credential) triple into a
//! per-file issue report, asynchronously: fetch the PR's changed
//! files, parse each unified-diff patch into added lines, classify
//! every added line through an LLM backend, and aggregate the results
//! while pollers read job status/result from the store by id.

pub mod classify;
pub mod diff;
pub mod domain;
pub mod fakes;
pub mod pipeline;
pub mod queue;
pub mod runner;
pub mod source;
pub mod telemetry;

pub use classify::{interpret, Classifier, ClassifierConfig, IssueFragment, OllamaClassifier};
pub use diff::parse_patch;
pub use domain::{
    FileReport, Issue, JobRequest, LineChange, Report, ReviewError, StoredResult, Summary,
    UnparsableReply,
};
pub use pipeline::{PipelineConfig, ReviewPipeline};
pub use queue::{JobQueue, QueueConfig};
pub use runner::JobRunner;
pub use source::{ChangeSource, ChangedFile, GitHubChangeSource, GithubConfig};
pub use telemetry::init_tracing;

pub use revq_store::{JobId, JobStatus, JobStore};

/// revq version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
