//! docsplit - splits scanned PDF bundles at barcode separator pages.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use docsplit::classifier::DocumentType;
use docsplit::config::{default_config_path, load_config, Config};
use docsplit::db::document_repo::{self, DocumentFilter};
use docsplit::db::job_repo::{self, JobFilter, JobStatus};
use docsplit::db::{log_repo, Database};
use docsplit::error::{ConfigError, DocsplitError, ProcessError};
use docsplit::pipeline::{Pipeline, PipelineConfig};
use docsplit::worker::{intake, ClaimOutcome, JobOrchestrator, PendingJobPoller, WorkerPool};

const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "docsplit", version, about = "Split scanned PDF bundles into classified documents")]
struct Cli {
    /// Configuration file (defaults to <config dir>/docsplit/config.json)
    #[arg(long, global = true, env = "DOCSPLIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Queue a PDF for processing and print its job id
    Submit {
        /// PDF file to upload
        pdf: PathBuf,
    },
    /// Process a single pending job in this process
    Process { job_id: String },
    /// Process pending jobs until interrupted
    Work {
        /// Number of worker threads (defaults to the configured worker_count)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List jobs, newest first
    Jobs {
        #[arg(long)]
        status: Option<JobStatus>,
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// List produced documents
    Documents {
        #[arg(long = "job")]
        job_id: Option<String>,
        #[arg(long = "type")]
        document_type: Option<DocumentType>,
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
    /// Show the processing log of a job
    Logs { job_id: String },
}

#[derive(Serialize)]
struct Page<T> {
    total: u64,
    items: Vec<T>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("docsplit: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_level);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("docsplit: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path().ok_or_else(|| ConfigError::Validation {
            message: "Could not determine the default config directory; pass --config".to_string(),
        })?,
    };
    load_config(&path)
}

/// `RUST_LOG` wins over the configured level. `log` records from the worker
/// and database layers are forwarded into tracing.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("docsplit: could not install tracing subscriber: {}", e);
        return;
    }
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("docsplit: could not forward log records: {}", e);
    }
}

fn run(command: Command, config: &Config) -> Result<(), DocsplitError> {
    let db = Database::open(&config.database_path())?;

    match command {
        Command::Submit { pdf } => {
            let bytes = std::fs::read(&pdf).map_err(|e| ProcessError::ReadDocument {
                path: pdf.clone(),
                source: e,
            })?;
            let filename = pdf
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload.pdf");
            let job = intake::submit(&db, config, filename, &bytes)?;
            println!("{}", job.job_id);
        }
        Command::Process { job_id } => {
            let orchestrator = build_orchestrator(config, db);
            match orchestrator.process_by_id(&job_id)? {
                ClaimOutcome::Processed(result) => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                ClaimOutcome::NotClaimed => {
                    println!("Job {} is not pending; nothing to do", job_id);
                }
            }
        }
        Command::Work { workers } => {
            let worker_count = workers.unwrap_or(config.worker_count).max(1);
            work(config, db, worker_count)?;
        }
        Command::Jobs {
            status,
            limit,
            offset,
        } => {
            let filter = JobFilter {
                status,
                limit: Some(limit),
                offset: Some(offset),
            };
            let (items, total) = job_repo::query(&db, &filter)?;
            println!("{}", serde_json::to_string_pretty(&Page { total, items })?);
        }
        Command::Documents {
            job_id,
            document_type,
            limit,
            offset,
        } => {
            let filter = DocumentFilter {
                job_id,
                document_type,
                limit: Some(limit),
                offset: Some(offset),
            };
            let (items, total) = document_repo::query(&db, &filter)?;
            println!("{}", serde_json::to_string_pretty(&Page { total, items })?);
        }
        Command::Logs { job_id } => {
            // Fails with NotFound for unknown ids instead of printing nothing.
            job_repo::get(&db, &job_id)?;
            let entries = log_repo::list_for_job(&db, &job_id)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

fn build_orchestrator(config: &Config, db: Database) -> Arc<JobOrchestrator> {
    let pipeline_config = Arc::new(PipelineConfig::from_config(config));
    let pipeline = Arc::new(Pipeline::from_config(pipeline_config, db.clone()));
    Arc::new(JobOrchestrator::new(db, pipeline))
}

fn work(config: &Config, db: Database, worker_count: usize) -> Result<(), DocsplitError> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let orchestrator = build_orchestrator(config, db.clone());
    let pool = WorkerPool::new(orchestrator, worker_count)?;
    let mut poller = PendingJobPoller::new(db, POLL_INTERVAL, (worker_count * 2) as u64);

    info!(workers = worker_count, "Worker started, press Ctrl-C to stop");
    poller.run(&pool, &shutdown);

    pool.shutdown();
    pool.wait();
    info!("Worker stopped");
    Ok(())
}
