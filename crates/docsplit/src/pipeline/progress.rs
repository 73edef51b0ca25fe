use std::sync::Mutex;

use tracing::warn;

use crate::classifier::DocumentType;
use crate::db::log_repo::{self, LogLevel};
use crate::db::Database;
use crate::worker::job::format_processing_time;

use super::error::PipelineWarning;

/// Events emitted while a job is processed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started {
        filename: String,
    },
    PagesRendered {
        count: usize,
    },
    Warning(PipelineWarning),
    DocumentStored {
        sequence: usize,
        filename: String,
        document_type: DocumentType,
        page_start: usize,
        page_end: usize,
    },
    Completed {
        documents_created: usize,
        total_pages: usize,
        processing_time: f64,
    },
    Failed {
        error: String,
    },
}

impl ProgressEvent {
    pub fn level(&self) -> LogLevel {
        match self {
            Self::Warning(_) => LogLevel::Warning,
            Self::Failed { .. } => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Started { filename } => format!("Starting processing of {}", filename),
            Self::PagesRendered { count } => format!("Converted PDF to {} page images", count),
            Self::Warning(warning) => warning.to_string(),
            Self::DocumentStored {
                sequence,
                filename,
                document_type,
                page_start,
                page_end,
            } => format!(
                "Document {} saved as {} ({}, pages {}-{})",
                sequence, filename, document_type, page_start, page_end
            ),
            Self::Completed {
                documents_created,
                total_pages,
                processing_time,
            } => format!(
                "Processing completed: {} documents created from {} pages in {}",
                documents_created,
                total_pages,
                format_processing_time(*processing_time)
            ),
            Self::Failed { error } => format!("Processing failed: {}", error),
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Appends every event to the job's processing log.
///
/// A failed write is traced and otherwise ignored; it never changes the
/// outcome of the job.
pub struct JobLogReporter {
    db: Database,
    job_id: String,
}

impl JobLogReporter {
    pub fn new(db: Database, job_id: &str) -> Self {
        Self {
            db,
            job_id: job_id.to_string(),
        }
    }
}

impl ProgressReporter for JobLogReporter {
    fn report(&self, event: ProgressEvent) {
        let level = event.level();
        let message = event.message();
        if let Err(e) = log_repo::append(&self.db, &self.job_id, level, &message) {
            warn!(job_id = %self.job_id, "Failed to write processing log: {}", e);
        }
    }
}

/// Keeps events in memory, for tests.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
