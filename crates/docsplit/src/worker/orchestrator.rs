//! Drives one job through its lifecycle.
//!
//! The orchestrator is the only place that turns pipeline errors into a
//! FAILED job; every stage below it just returns `Result`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::db::job_repo::{self, JobCompletion};
use crate::db::{now_timestamp, Database, DatabaseError};
use crate::pipeline::{
    JobLogReporter, Pipeline, PipelineContext, PipelineError, ProgressEvent, ProgressReporter,
};
use crate::sanitize::truncate_message;
use crate::worker::job::{JobResult, QueuedJob};

/// Longest error message stored on a failed job.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Processed(JobResult),
    /// The job was unknown or no longer PENDING. Its row was not touched.
    NotClaimed,
}

pub struct JobOrchestrator {
    db: Database,
    pipeline: Arc<Pipeline>,
}

impl JobOrchestrator {
    pub fn new(db: Database, pipeline: Arc<Pipeline>) -> Self {
        Self { db, pipeline }
    }

    /// Looks up a job by id and processes it.
    pub fn process_by_id(&self, job_id: &str) -> Result<ClaimOutcome, DatabaseError> {
        match job_repo::find_by_id(&self.db, job_id)? {
            Some(row) => self.process(&QueuedJob::from_row(&row)),
            None => {
                warn!(job_id, "Job not found");
                Ok(ClaimOutcome::NotClaimed)
            }
        }
    }

    /// Claims `job` and runs it to a terminal state.
    ///
    /// Errors are returned only when the job row itself cannot be updated;
    /// everything the pipeline does wrong ends up as a FAILED job.
    pub fn process(&self, job: &QueuedJob) -> Result<ClaimOutcome, DatabaseError> {
        let started = Instant::now();

        if !job_repo::mark_processing(&self.db, &job.job_id, &now_timestamp())? {
            info!(job_id = %job.job_id, "Job not claimable, skipping");
            return Ok(ClaimOutcome::NotClaimed);
        }

        let reporter = JobLogReporter::new(self.db.clone(), &job.job_id);
        reporter.report(ProgressEvent::Started {
            filename: job.filename.clone(),
        });

        let mut ctx = PipelineContext::new(job.clone());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pipeline.run(&mut ctx, &reporter)
        }))
        .unwrap_or_else(|payload| Err(PipelineError::Unknown(panic_message(payload.as_ref()))));

        let processing_time = started.elapsed().as_secs_f64();

        let result = match outcome {
            Ok(()) => {
                let completion = JobCompletion {
                    total_pages: ctx.total_pages,
                    processed_pages: ctx.total_pages,
                    documents_created: ctx.documents_created(),
                    processing_time,
                };
                if !job_repo::mark_completed(&self.db, &job.job_id, &completion, &now_timestamp())? {
                    warn!(job_id = %job.job_id, "Job left PROCESSING before completion was recorded");
                }
                reporter.report(ProgressEvent::Completed {
                    documents_created: completion.documents_created,
                    total_pages: completion.total_pages,
                    processing_time,
                });
                info!(
                    job_id = %job.job_id,
                    documents = completion.documents_created,
                    pages = completion.total_pages,
                    "Job completed"
                );
                JobResult::completed(
                    job,
                    completion.total_pages,
                    completion.documents_created,
                    processing_time,
                )
            }
            Err(e) => {
                error!(job_id = %job.job_id, error = ?e, "Job failed");
                let message = truncate_message(&e.to_string(), MAX_ERROR_MESSAGE_CHARS);
                if !job_repo::mark_failed(
                    &self.db,
                    &job.job_id,
                    &message,
                    processing_time,
                    &now_timestamp(),
                )? {
                    warn!(job_id = %job.job_id, "Job left PROCESSING before failure was recorded");
                }
                reporter.report(ProgressEvent::Failed {
                    error: message.clone(),
                });
                JobResult::failed(job, message, processing_time)
            }
        };

        Ok(ClaimOutcome::Processed(result))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with non-string payload".to_string()
    }
}
