//! revq — PR line review from the command line.
//!
//! ## Commands
//!
//! - `review`: run one review job to completion and print the report
//! - `status`: look up a job's status by id
//! - `result`: look up a job's stored report by id

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use revq_core::{
    init_tracing, GitHubChangeSource, JobRequest, JobRunner, OllamaClassifier, PipelineConfig,
    ReviewPipeline,
};
use revq_store::{JobId, JobStore, SurrealJobStore};

#[derive(Parser)]
#[command(name = "revq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pull-request line review as asynchronous jobs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one review job to completion and print the report as JSON
    Review {
        /// Repository URL (owner/repo are the last two path segments)
        #[arg(long)]
        repo: String,

        /// Pull request number
        #[arg(long)]
        pr: u64,

        /// API credential for the change source
        #[arg(long, env = "GITHUB_TOKEN")]
        token: String,

        /// Maximum concurrent outbound calls for this job
        #[arg(long)]
        fan_out: Option<usize>,
    },

    /// Show the status of a job
    Status {
        /// Job identifier returned at submission
        job_id: String,
    },

    /// Show the stored report of a job
    Result {
        /// Job identifier returned at submission
        job_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let store = SurrealJobStore::from_env()
        .await
        .context("failed to open job store")?;

    match cli.command {
        Commands::Review {
            repo,
            pr,
            token,
            fan_out,
        } => run_review(store, repo, pr, token, fan_out).await,
        Commands::Status { job_id } => show_status(store, job_id).await,
        Commands::Result { job_id } => show_result(store, job_id).await,
    }
}

async fn run_review(
    store: SurrealJobStore,
    repo: String,
    pr: u64,
    token: String,
    fan_out: Option<usize>,
) -> Result<ExitCode> {
    let store: Arc<dyn JobStore> = Arc::new(store);
    let mut config = PipelineConfig::from_env();
    if let Some(fan_out) = fan_out {
        config.fan_out = fan_out;
    }

    let pipeline = ReviewPipeline::new(
        Arc::new(GitHubChangeSource::from_env()),
        Arc::new(OllamaClassifier::from_env()),
        config,
    );
    let runner = JobRunner::new(pipeline, store.clone());

    let job_id = JobId::new();
    let request = JobRequest::new(repo, pr, token);
    runner.run(&job_id, &request).await;

    match store.get_result(&job_id).await? {
        Some(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("job {job_id} produced no result");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn show_status(store: SurrealJobStore, job_id: String) -> Result<ExitCode> {
    let job_id = JobId::from(job_id.as_str());
    match store.get_status(&job_id).await? {
        Some(status) => {
            println!(
                "{}",
                serde_json::json!({ "job_id": job_id.to_string(), "status": status })
            );
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("job {job_id} not found");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn show_result(store: SurrealJobStore, job_id: String) -> Result<ExitCode> {
    let job_id = JobId::from(job_id.as_str());

    // A result is only readable once the job has reached a terminal
    // status; anything earlier is "not available", not an error shape.
    let terminal = store
        .get_status(&job_id)
        .await?
        .map(|s| s.is_terminal())
        .unwrap_or(false);
    if !terminal {
        eprintln!("result for job {job_id} not available");
        return Ok(ExitCode::FAILURE);
    }

    match store.get_result(&job_id).await? {
        Some(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("result for job {job_id} not available");
            Ok(ExitCode::FAILURE)
        }
    }
}
