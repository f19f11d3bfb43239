//! revqd — the revq worker daemon.
//!
//! Hosts the job queue and worker pool. Submissions arrive as
//! newline-delimited JSON on stdin (the HTTP front door lives outside
//! this binary); each accepted submission prints a `{"job_id": ...}`
//! line on stdout, and pollers read status/result from the shared
//! store.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn, Level};

use revq_core::queue::{JobQueue, QueueConfig};
use revq_core::{
    init_tracing, GitHubChangeSource, JobRequest, JobRunner, OllamaClassifier, PipelineConfig,
    ReviewPipeline,
};
use revq_store::{JobStore, SurrealJobStore};

#[derive(Parser)]
#[command(name = "revqd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "revq worker daemon", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Number of worker tasks (overrides REVQ_WORKERS)
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let store: Arc<dyn JobStore> = Arc::new(
        SurrealJobStore::from_env()
            .await
            .context("failed to open job store")?,
    );

    let pipeline = ReviewPipeline::new(
        Arc::new(GitHubChangeSource::from_env()),
        Arc::new(OllamaClassifier::from_env()),
        PipelineConfig::from_env(),
    );
    let runner = Arc::new(JobRunner::new(pipeline, store.clone()));

    let mut queue_config = QueueConfig::from_env();
    if let Some(workers) = cli.workers {
        queue_config.workers = workers;
    }
    info!(
        workers = queue_config.workers,
        capacity = queue_config.capacity,
        "revqd starting"
    );
    let queue = JobQueue::start(runner, store, queue_config);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<JobRequest>(line) {
                        Ok(request) => match queue.submit(request).await {
                            Ok(job_id) => {
                                println!("{}", serde_json::json!({ "job_id": job_id.to_string() }));
                            }
                            Err(e) => error!(error = %e, "submission failed"),
                        },
                        Err(e) => warn!(error = %e, "ignoring malformed submission line"),
                    }
                }
                None => {
                    info!("stdin closed; draining queue");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received; draining queue");
                break;
            }
        }
    }

    queue.shutdown().await;
    info!("revqd stopped");
    Ok(())
}
