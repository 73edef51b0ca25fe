use crate::processor::{Barcode, SourceDocument};

use super::plan::SegmentPlan;
use super::SegmentError;

/// A segment ready to be classified and written out.
#[derive(Debug, Clone)]
pub struct SegmentDraft {
    pub sequence: usize,
    pub page_start: usize,
    pub page_end: usize,
    pub total_pages: usize,
    pub barcode: Option<Barcode>,
    pub blank_pages_skipped: usize,
    pub ocr_text: Option<String>,
    /// Standalone PDF holding the retained pages.
    pub pdf_bytes: Vec<u8>,
}

impl SegmentDraft {
    pub fn barcode_value(&self) -> Option<&str> {
        self.barcode.as_ref().map(|b| b.value.as_str())
    }
}

pub fn assemble(source: &SourceDocument, plan: &SegmentPlan) -> Result<SegmentDraft, SegmentError> {
    let pdf_bytes = source
        .extract_pages(&plan.content_pages)
        .map_err(|e| SegmentError::Assembly {
            sequence: plan.sequence,
            source: e,
        })?;

    Ok(SegmentDraft {
        sequence: plan.sequence,
        page_start: plan.page_start,
        page_end: plan.page_end,
        total_pages: plan.total_pages(),
        barcode: plan.barcode.clone(),
        blank_pages_skipped: plan.blank_pages_skipped,
        ocr_text: plan.joined_text(),
        pdf_bytes,
    })
}
