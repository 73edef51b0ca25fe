//! Page analysis: turns rendered page images into ordered [`PageSignal`]s.

pub mod blank;
pub mod signal;

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::ProcessError;
use crate::processor::{Barcode, BarcodeDecoder, TextRecognizer};

pub use blank::classify_blank;
pub use signal::{AnalysisStage, AnalysisWarning, PageSignal};

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub blank_threshold: f64,
    pub ocr_language: String,
    /// Upper bound on threads used for one batch of pages.
    pub parallelism: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            blank_threshold: 0.98,
            ocr_language: "spa".to_string(),
            parallelism: num_cpus::get(),
        }
    }
}

/// Signals for every page of a batch, plus the per-page failures that were
/// recovered along the way.
#[derive(Debug, Default)]
pub struct PageAnalysis {
    pub signals: Vec<PageSignal>,
    pub warnings: Vec<AnalysisWarning>,
}

impl PageAnalysis {
    pub fn blank_pages(&self) -> usize {
        self.signals.iter().filter(|s| s.is_blank()).count()
    }

    pub fn separators(&self) -> usize {
        self.signals.iter().filter(|s| s.is_separator()).count()
    }
}

pub struct PageAnalyzer {
    config: AnalyzerConfig,
    decoder: Arc<dyn BarcodeDecoder>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl PageAnalyzer {
    pub fn new(
        config: AnalyzerConfig,
        decoder: Arc<dyn BarcodeDecoder>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        Self {
            config,
            decoder,
            recognizer,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn classify_blank(&self, image: &DynamicImage) -> bool {
        blank::classify_blank(image, self.config.blank_threshold)
    }

    /// Returns the first barcode the decoder reports. When a page carries
    /// several codes the decoder's order decides; no tie-break is applied.
    pub fn detect_separator(&self, image: &DynamicImage) -> Result<Option<Barcode>, ProcessError> {
        Ok(self.decoder.decode(image)?.into_iter().next())
    }

    pub fn extract_text(&self, image: &DynamicImage) -> Result<String, ProcessError> {
        let text = self.recognizer.recognize(image, &self.config.ocr_language)?;
        Ok(text.trim().to_string())
    }

    /// Analyzes one page. Blank pages skip barcode and OCR; OCR only runs
    /// when no barcode was found.
    pub fn analyze_page(
        &self,
        page_number: usize,
        image: &DynamicImage,
    ) -> (PageSignal, Vec<AnalysisWarning>) {
        if self.classify_blank(image) {
            debug!(page = page_number, "Blank page");
            return (PageSignal::blank(page_number), Vec::new());
        }

        let mut warnings = Vec::new();

        match self.detect_separator(image) {
            Ok(Some(barcode)) => {
                info!(
                    page = page_number,
                    value = %barcode.value,
                    symbology = %barcode.symbology,
                    "Barcode detected"
                );
                return (PageSignal::separator(page_number, barcode), warnings);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(page = page_number, "Barcode detection failed: {}", e);
                warnings.push(AnalysisWarning {
                    page_number,
                    stage: AnalysisStage::Barcode,
                    message: e.to_string(),
                });
            }
        }

        let ocr_text = match self.extract_text(image) {
            Ok(text) => {
                debug!(page = page_number, chars = text.len(), "OCR text extracted");
                Some(text)
            }
            Err(e) => {
                warn!(page = page_number, "OCR failed: {}", e);
                warnings.push(AnalysisWarning {
                    page_number,
                    stage: AnalysisStage::Ocr,
                    message: e.to_string(),
                });
                None
            }
        };

        (PageSignal::content(page_number, ocr_text), warnings)
    }

    /// Analyzes every page, one signal per image, in input order.
    ///
    /// Pages are split into contiguous chunks analyzed on scoped threads;
    /// chunk results are concatenated in chunk order, which restores the
    /// original page order.
    pub fn analyze(&self, images: &[DynamicImage]) -> PageAnalysis {
        let _span = tracing::info_span!("analyzer.analyze", pages = images.len()).entered();

        if images.is_empty() {
            return PageAnalysis::default();
        }

        let workers = self.config.parallelism.clamp(1, images.len());
        let chunk_size = images.len().div_ceil(workers);

        let per_page: Vec<(PageSignal, Vec<AnalysisWarning>)> = if workers == 1 {
            self.analyze_chunk(0, images)
        } else {
            std::thread::scope(|scope| {
                let handles: Vec<_> = images
                    .chunks(chunk_size)
                    .enumerate()
                    .map(|(chunk_idx, chunk)| {
                        scope.spawn(move || self.analyze_chunk(chunk_idx * chunk_size, chunk))
                    })
                    .collect();

                handles
                    .into_iter()
                    .flat_map(|handle| match handle.join() {
                        Ok(results) => results,
                        Err(payload) => std::panic::resume_unwind(payload),
                    })
                    .collect()
            })
        };

        let mut analysis = PageAnalysis {
            signals: Vec::with_capacity(per_page.len()),
            warnings: Vec::new(),
        };
        for (signal, warnings) in per_page {
            analysis.signals.push(signal);
            analysis.warnings.extend(warnings);
        }

        info!(
            pages = analysis.signals.len(),
            blank = analysis.blank_pages(),
            separators = analysis.separators(),
            warnings = analysis.warnings.len(),
            "Page analysis finished"
        );
        analysis
    }

    fn analyze_chunk(
        &self,
        offset: usize,
        chunk: &[DynamicImage],
    ) -> Vec<(PageSignal, Vec<AnalysisWarning>)> {
        chunk
            .iter()
            .enumerate()
            .map(|(i, image)| self.analyze_page(offset + i + 1, image))
            .collect()
    }
}
