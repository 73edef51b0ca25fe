//! Accepts uploaded PDFs and queues them as PENDING jobs.

use log::{info, warn};
use thiserror::Error;

use crate::config::Config;
use crate::db::{job_repo, now_timestamp, Database, DatabaseError};
use crate::error::StorageError;
use crate::sanitize::sanitize_filename;
use crate::storage::filesystem::{ensure_directory, write_new};
use crate::worker::job::{generate_job_id, QueuedJob};

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Unsupported file type: {0} (only PDF files are accepted)")]
    UnsupportedFormat(String),

    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("Failed to store upload: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to record job: {0}")]
    Database(#[from] DatabaseError),
}

/// Whether `filename` names a PDF, judged by the MIME type of its extension.
pub fn is_pdf_filename(filename: &str) -> bool {
    mime_guess::from_path(filename)
        .first()
        .is_some_and(|mime| mime == mime_guess::mime::APPLICATION_PDF)
}

/// Stores `bytes` under the input directory and creates a PENDING job.
pub fn submit(
    db: &Database,
    config: &Config,
    filename: &str,
    bytes: &[u8],
) -> Result<QueuedJob, IntakeError> {
    if !is_pdf_filename(filename) {
        return Err(IntakeError::UnsupportedFormat(filename.to_string()));
    }

    let size = bytes.len() as u64;
    if size > config.max_upload_bytes {
        return Err(IntakeError::TooLarge {
            size,
            limit: config.max_upload_bytes,
        });
    }

    let job_id = generate_job_id();
    let safe_name = sanitize_filename(filename);

    let input_dir = config.input_directory();
    ensure_directory(&input_dir)?;
    let storage_path = input_dir.join(format!("{}_{}", job_id, safe_name));
    write_new(&storage_path, bytes)?;

    if let Err(e) = job_repo::insert_pending(
        db,
        &job_id,
        &safe_name,
        &storage_path.display().to_string(),
        &now_timestamp(),
    ) {
        if let Err(remove_err) = std::fs::remove_file(&storage_path) {
            warn!(
                "Could not remove orphaned upload {}: {}",
                storage_path.display(),
                remove_err
            );
        }
        return Err(e.into());
    }

    info!("Queued job {} for {} ({} bytes)", job_id, safe_name, size);

    Ok(QueuedJob {
        job_id,
        filename: safe_name,
        storage_path,
    })
}
