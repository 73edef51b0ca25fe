use std::fmt;

use crate::processor::Barcode;

/// What the analyzer learned about one page.
///
/// Fields are private so the invariants hold by construction: a page is a
/// separator exactly when it carries a barcode, and a blank page carries
/// neither a barcode nor text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSignal {
    page_number: usize,
    is_blank: bool,
    barcode: Option<Barcode>,
    ocr_text: Option<String>,
}

impl PageSignal {
    pub fn blank(page_number: usize) -> Self {
        Self {
            page_number,
            is_blank: true,
            barcode: None,
            ocr_text: None,
        }
    }

    pub fn separator(page_number: usize, barcode: Barcode) -> Self {
        Self {
            page_number,
            is_blank: false,
            barcode: Some(barcode),
            ocr_text: None,
        }
    }

    /// A non-blank page without a barcode. `ocr_text` is `None` when OCR
    /// failed on the page.
    pub fn content(page_number: usize, ocr_text: Option<String>) -> Self {
        Self {
            page_number,
            is_blank: false,
            barcode: None,
            ocr_text,
        }
    }

    /// 1-based position in the source document.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn is_blank(&self) -> bool {
        self.is_blank
    }

    pub fn is_separator(&self) -> bool {
        self.barcode.is_some()
    }

    pub fn barcode(&self) -> Option<&Barcode> {
        self.barcode.as_ref()
    }

    pub fn ocr_text(&self) -> Option<&str> {
        self.ocr_text.as_deref()
    }
}

/// Which per-page step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Barcode,
    Ocr,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Barcode => f.write_str("barcode detection"),
            Self::Ocr => f.write_str("OCR"),
        }
    }
}

/// A recovered per-page failure. The page's signal was degraded instead of
/// aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisWarning {
    pub page_number: usize,
    pub stage: AnalysisStage,
    pub message: String,
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Page {}: {} failed: {}",
            self.page_number, self.stage, self.message
        )
    }
}
