//! Domain models for revq.
//!
//! Canonical definitions for the core entities:
//! - `JobRequest`: the inputs a review job runs against
//! - `Report`: the per-file issue report a job produces
//! - `ReviewError`: the pipeline error taxonomy

pub mod error;
pub mod job;
pub mod report;

pub use error::{Result, ReviewError, UnparsableReply};
pub use job::JobRequest;
pub use report::{FileReport, Issue, LineChange, Report, StoredResult, Summary};
