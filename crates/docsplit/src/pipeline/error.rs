use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::analyzer::AnalysisWarning;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source file not found: {}", crate::sanitize::redact_path(.0))]
    SourceMissing(PathBuf),

    #[error("Document processing failed: {0}")]
    Processing(#[from] crate::error::ProcessError),

    #[error("Segmentation failed: {0}")]
    Segmentation(#[from] crate::segmenter::SegmentError),

    #[error("Storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    /// A stage panicked; carries the panic message.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

/// Non-fatal conditions recorded while a job still completes.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineWarning {
    PageAnalysis(AnalysisWarning),
    LeadingPagesIgnored { count: usize },
    SegmentDropped {
        sequence: usize,
        page_start: usize,
        page_end: usize,
    },
    NoDocuments,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageAnalysis(w) => write!(f, "{}", w),
            Self::LeadingPagesIgnored { count } => write!(
                f,
                "{} page(s) before the first separator were not assigned to any document",
                count
            ),
            Self::SegmentDropped {
                sequence,
                page_start,
                page_end,
            } => write!(
                f,
                "Document {} (pages {}-{}) has no content pages and was skipped",
                sequence, page_start, page_end
            ),
            Self::NoDocuments => f.write_str("No documents were produced from this file"),
        }
    }
}
