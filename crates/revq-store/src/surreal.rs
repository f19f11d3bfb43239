//! SurrealDB-backed JobStore implementation
//!
//! Persists the status and result namespaces as two tables keyed by
//! job id. Rows are written with `UPSERT`, so repeated writes for the
//! same job are last-value-wins, matching the [`JobStore`] contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::info;

use crate::error::StoreError;
use crate::traits::{JobId, JobStatus, JobStore, StoreResult};

#[derive(Debug, Serialize, Deserialize)]
struct StatusRow {
    job_id: String,
    status: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultRow {
    job_id: String,
    payload: serde_json::Value,
    updated_at: DateTime<Utc>,
}

/// SurrealDB-backed implementation of [`JobStore`].
pub struct SurrealJobStore {
    db: Surreal<Any>,
}

impl SurrealJobStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `revq/jobs`, and runs `init_schema`.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("mem://").await
    }

    /// Create from environment variables.
    ///
    /// Honors `SURREALDB_URL`; without it, falls back to local
    /// persistence under `.revq/db`.
    pub async fn from_env() -> StoreResult<Self> {
        if let Ok(url) = std::env::var("SURREALDB_URL") {
            return Self::connect(&url).await;
        }

        let path = ".revq/db";
        std::fs::create_dir_all(path).map_err(|e| {
            StoreError::Connection(format!("Failed to create store directory {}: {}", path, e))
        })?;
        let url = format!("surrealkv://{}", path);
        info!("No SURREALDB_URL set, using local persistence: {}", url);
        Self::connect(&url).await
    }

    /// Connect to an explicit SurrealDB endpoint
    /// (`mem://`, `surrealkv://path`, `ws://host`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns("revq")
            .use_db("jobs")
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::init_schema(&db).await?;

        info!("SurrealJobStore connected ({})", url);
        Ok(Self { db })
    }

    async fn init_schema(db: &Surreal<Any>) -> StoreResult<()> {
        db.query("DEFINE TABLE IF NOT EXISTS job_status SCHEMALESS")
            .query("DEFINE TABLE IF NOT EXISTS job_result SCHEMALESS")
            .await
            .map_err(|e| StoreError::Query(format!("Schema init failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for SurrealJobStore {
    async fn set_status(&self, job_id: &JobId, status: JobStatus) -> StoreResult<()> {
        let row = StatusRow {
            job_id: job_id.0.clone(),
            status: status.as_str().to_string(),
            updated_at: Utc::now(),
        };
        self.db
            .query("UPSERT type::thing('job_status', $jid) CONTENT $row")
            .bind(("jid", job_id.0.clone()))
            .bind(("row", row))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn get_status(&self, job_id: &JobId) -> StoreResult<Option<JobStatus>> {
        let mut res = self
            .db
            .query("SELECT * FROM type::thing('job_status', $jid)")
            .bind(("jid", job_id.0.clone()))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let rows: Vec<StatusRow> = res.take(0).map_err(|e| StoreError::Query(e.to_string()))?;
        rows.into_iter()
            .next()
            .map(|row| JobStatus::parse(&row.status))
            .transpose()
    }

    async fn set_result(&self, job_id: &JobId, result: &serde_json::Value) -> StoreResult<()> {
        let row = ResultRow {
            job_id: job_id.0.clone(),
            payload: result.clone(),
            updated_at: Utc::now(),
        };
        self.db
            .query("UPSERT type::thing('job_result', $jid) CONTENT $row")
            .bind(("jid", job_id.0.clone()))
            .bind(("row", row))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn get_result(&self, job_id: &JobId) -> StoreResult<Option<serde_json::Value>> {
        let mut res = self
            .db
            .query("SELECT * FROM type::thing('job_result', $jid)")
            .bind(("jid", job_id.0.clone()))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let rows: Vec<ResultRow> = res.take(0).map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(rows.into_iter().next().map(|row| row.payload))
    }
}
