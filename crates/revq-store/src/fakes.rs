//! In-memory fake for the job store (testing only)
//!
//! Provides `MemoryJobStore`, which satisfies the [`JobStore`] contract
//! without any external dependencies. Both namespaces live under one
//! mutex, so a terminal status and its result become visible together.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::traits::{JobId, JobStatus, JobStore, StoreResult};

#[derive(Debug, Default)]
struct Namespaces {
    status: HashMap<String, JobStatus>,
    result: HashMap<String, serde_json::Value>,
}

/// In-memory job store backed by a `HashMap` per namespace.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    inner: Mutex<Namespaces>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn set_status(&self, job_id: &JobId, status: JobStatus) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.status.insert(job_id.0.clone(), status);
        Ok(())
    }

    async fn get_status(&self, job_id: &JobId) -> StoreResult<Option<JobStatus>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.status.get(&job_id.0).copied())
    }

    async fn set_result(&self, job_id: &JobId, result: &serde_json::Value) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.result.insert(job_id.0.clone(), result.clone());
        Ok(())
    }

    async fn get_result(&self, job_id: &JobId) -> StoreResult<Option<serde_json::Value>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.result.get(&job_id.0).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn status_write_then_read() {
        let store = MemoryJobStore::new();
        let id = JobId::new();

        store.set_status(&id, JobStatus::Processing).await.unwrap();
        assert_eq!(
            store.get_status(&id).await.unwrap(),
            Some(JobStatus::Processing)
        );
    }

    #[tokio::test]
    async fn unknown_id_reads_as_none() {
        let store = MemoryJobStore::new();
        let id = JobId::new();

        assert_eq!(store.get_status(&id).await.unwrap(), None);
        assert_eq!(store.get_result(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn result_is_last_value_wins() {
        let store = MemoryJobStore::new();
        let id = JobId::new();

        store.set_result(&id, &json!({"v": 1})).await.unwrap();
        store.set_result(&id, &json!({"v": 2})).await.unwrap();
        assert_eq!(store.get_result(&id).await.unwrap(), Some(json!({"v": 2})));
    }
}
