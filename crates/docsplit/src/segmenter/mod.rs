//! Splits an analyzed source into separator-delimited documents.

pub mod assemble;
pub mod plan;

use thiserror::Error;
use tracing::debug;

use crate::analyzer::PageSignal;
use crate::error::ProcessError;
use crate::processor::SourceDocument;

pub use assemble::{assemble, SegmentDraft};
pub use plan::{plan, DroppedSegment, SegmentPlan, SegmentationPlan};

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("Page count mismatch: {signals} page signals for a {pages}-page source")]
    PageCountMismatch { signals: usize, pages: usize },

    #[error("Failed to assemble document {sequence}: {source}")]
    Assembly {
        sequence: usize,
        #[source]
        source: ProcessError,
    },
}

/// Fails unless there is exactly one signal per source page.
pub fn check_page_count(source: &SourceDocument, signals: &[PageSignal]) -> Result<(), SegmentError> {
    let pages = source.page_count();
    if pages != signals.len() {
        return Err(SegmentError::PageCountMismatch {
            signals: signals.len(),
            pages,
        });
    }
    Ok(())
}

/// A checked segmentation of one source.
///
/// Drafts are assembled lazily, one per retained segment and in page order,
/// so a caller can persist each document before the next one is built.
pub struct Segmentation<'a> {
    source: &'a SourceDocument,
    plan: SegmentationPlan,
}

impl<'a> Segmentation<'a> {
    pub fn new(source: &'a SourceDocument, signals: &[PageSignal]) -> Result<Self, SegmentError> {
        check_page_count(source, signals)?;
        let plan = plan(signals);
        debug!(
            segments = plan.segments.len(),
            dropped = plan.dropped.len(),
            leading = plan.leading_pages_ignored,
            "Segmentation planned"
        );
        Ok(Self { source, plan })
    }

    pub fn plan(&self) -> &SegmentationPlan {
        &self.plan
    }

    pub fn drafts(&self) -> impl Iterator<Item = Result<SegmentDraft, SegmentError>> + '_ {
        self.plan
            .segments
            .iter()
            .map(move |segment| assemble(self.source, segment))
    }
}
