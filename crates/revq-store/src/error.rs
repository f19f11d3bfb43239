//! Error types for revq-store

use thiserror::Error;

/// Errors that can occur in the job persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection error
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Store query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Stored status string does not name a known job status
    #[error("Invalid job status: {0}")]
    InvalidStatus(String),
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
