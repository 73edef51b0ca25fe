use std::path::PathBuf;

use serde::Serialize;

use crate::db::job_repo::{JobRow, JobStatus};

/// A PENDING job handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedJob {
    pub job_id: String,
    /// Sanitized original file name.
    pub filename: String,
    /// Where intake wrote the upload.
    pub storage_path: PathBuf,
}

impl QueuedJob {
    pub fn from_row(row: &JobRow) -> Self {
        Self {
            job_id: row.job_id.clone(),
            filename: row.filename.clone(),
            storage_path: PathBuf::from(&row.source_path),
        }
    }
}

/// Terminal outcome of one processed job.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: String,
    pub status: JobStatus,
    pub total_pages: Option<usize>,
    pub documents_created: usize,
    pub error: Option<String>,
    pub processing_time: f64,
}

impl JobResult {
    pub fn completed(
        job: &QueuedJob,
        total_pages: usize,
        documents_created: usize,
        processing_time: f64,
    ) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: JobStatus::Completed,
            total_pages: Some(total_pages),
            documents_created,
            error: None,
            processing_time,
        }
    }

    pub fn failed(job: &QueuedJob, error: String, processing_time: f64) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: JobStatus::Failed,
            total_pages: None,
            documents_created: 0,
            error: Some(error),
            processing_time,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

/// `job_` followed by 12 lowercase hex characters.
pub fn generate_job_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("job_{}", &id[..12])
}

/// Human-readable duration: seconds below a minute, minutes below an hour,
/// hours otherwise.
pub fn format_processing_time(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{:.2}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.2}m", seconds / 60.0)
    } else {
        format!("{:.2}h", seconds / 3600.0)
    }
}
