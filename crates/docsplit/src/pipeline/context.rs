use std::path::PathBuf;

use image::DynamicImage;

use crate::analyzer::PageSignal;
use crate::classifier::DocumentType;
use crate::worker::job::QueuedJob;

use super::error::PipelineWarning;

/// A document that was written to disk and recorded in the database.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: i64,
    pub sequence: usize,
    pub document_type: DocumentType,
    pub path: PathBuf,
    pub page_start: usize,
    pub page_end: usize,
}

pub struct PipelineContext {
    pub job: QueuedJob,

    // Step 1 result
    pub pdf_bytes: Option<Vec<u8>>,

    // Step 2 result, released once analysis is done
    pub pages: Vec<DynamicImage>,
    pub total_pages: usize,

    // Step 3 result
    pub signals: Vec<PageSignal>,

    // Step 4 results
    pub stored: Vec<StoredDocument>,

    pub warnings: Vec<PipelineWarning>,
}

impl PipelineContext {
    pub fn new(job: QueuedJob) -> Self {
        Self {
            job,
            pdf_bytes: None,
            pages: Vec::new(),
            total_pages: 0,
            signals: Vec::new(),
            stored: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn documents_created(&self) -> usize {
        self.stored.len()
    }
}
