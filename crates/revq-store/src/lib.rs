//! revq job store
//!
//! Key-value persistence for review jobs: a status namespace and a
//! result namespace, both keyed by job id. Backends implement the
//! [`JobStore`] trait; an in-memory fake is provided for tests and a
//! SurrealDB implementation for real deployments.
//!
//! Writes are last-value-wins per namespace. A job has exactly one
//! writer (its runner) and arbitrary concurrent readers (pollers), so
//! no locking is required beyond what each backend already does.

pub mod error;
pub mod fakes;
pub mod surreal;
pub mod traits;

pub use error::StoreError;
pub use fakes::MemoryJobStore;
pub use surreal::SurrealJobStore;
pub use traits::{JobId, JobStatus, JobStore, StoreResult};
