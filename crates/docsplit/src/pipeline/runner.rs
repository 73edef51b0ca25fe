use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::analyzer::PageAnalyzer;
use crate::classifier;
use crate::db::document_repo::{self, NewDocument};
use crate::db::{now_timestamp, Database};
use crate::error::ProcessError;
use crate::processor::{
    BarcodeDecoder, PageRenderer, PdftoppmRenderer, SourceDocument, TesseractOcr,
    TextRecognizer, ZbarDecoder,
};
use crate::sanitize;
use crate::segmenter::{SegmentDraft, Segmentation};
use crate::storage::ArtifactStore;

use super::config::PipelineConfig;
use super::context::{PipelineContext, StoredDocument};
use super::error::{PipelineError, PipelineWarning};
use super::progress::{ProgressEvent, ProgressReporter};

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    db: Database,
    renderer: Arc<dyn PageRenderer>,
    analyzer: PageAnalyzer,
    store: ArtifactStore,
}

impl Pipeline {
    /// Production constructor: poppler for rendering, zbar for barcodes,
    /// Tesseract for OCR.
    pub fn from_config(config: Arc<PipelineConfig>, db: Database) -> Self {
        let recognizer = TesseractOcr::new(config.tessdata_dir.as_deref());
        Self::with_collaborators(
            config,
            db,
            Arc::new(PdftoppmRenderer::new()),
            Arc::new(ZbarDecoder::new()),
            Arc::new(recognizer),
        )
    }

    pub fn with_collaborators(
        config: Arc<PipelineConfig>,
        db: Database,
        renderer: Arc<dyn PageRenderer>,
        decoder: Arc<dyn BarcodeDecoder>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        let analyzer = PageAnalyzer::new(config.analyzer_config(), decoder, recognizer);
        let store = ArtifactStore::new(&config.output_directory);
        Self {
            config,
            db,
            renderer,
            analyzer,
            store,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage for one job. Documents stored before a failure stay
    /// on disk and in the database.
    pub fn run(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let filename = sanitize::redact_path(&ctx.job.storage_path);
        let _pipeline_span = info_span!("pipeline",
            job_id = %ctx.job.job_id,
            filename = %filename,
        )
        .entered();

        {
            let _step = info_span!("read_source").entered();
            self.step_read_source(ctx)?;
        }

        {
            let _step = info_span!("render").entered();
            self.step_render(ctx)?;
            progress.report(ProgressEvent::PagesRendered {
                count: ctx.total_pages,
            });
        }

        {
            let _step = info_span!("analyze").entered();
            self.step_analyze(ctx, progress);
        }

        {
            let _step = info_span!("segment_and_store").entered();
            self.step_segment_and_store(ctx, progress)?;
        }

        Ok(())
    }

    fn step_read_source(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let path = &ctx.job.storage_path;
        if !path.is_file() {
            return Err(PipelineError::SourceMissing(path.clone()));
        }

        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadDocument {
            path: path.clone(),
            source: e,
        })?;
        debug!(bytes = bytes.len(), "Read source document");
        ctx.pdf_bytes = Some(bytes);
        Ok(())
    }

    fn step_render(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let bytes = source_bytes(ctx)?;
        let pages = self.renderer.render(bytes, self.config.ocr_dpi)?;
        ctx.total_pages = pages.len();
        ctx.pages = pages;
        Ok(())
    }

    fn step_analyze(&self, ctx: &mut PipelineContext, progress: &dyn ProgressReporter) {
        let pages = std::mem::take(&mut ctx.pages);
        let analysis = self.analyzer.analyze(&pages);
        drop(pages);

        for warning in analysis.warnings {
            record_warning(ctx, progress, PipelineWarning::PageAnalysis(warning));
        }
        ctx.signals = analysis.signals;
    }

    fn step_segment_and_store(
        &self,
        ctx: &mut PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let source = SourceDocument::load(source_bytes(ctx)?)?;
        let segmentation = Segmentation::new(&source, &ctx.signals)?;
        let plan = segmentation.plan();

        if plan.leading_pages_ignored > 0 {
            record_warning(
                ctx,
                progress,
                PipelineWarning::LeadingPagesIgnored {
                    count: plan.leading_pages_ignored,
                },
            );
        }
        for dropped in &plan.dropped {
            record_warning(
                ctx,
                progress,
                PipelineWarning::SegmentDropped {
                    sequence: dropped.sequence,
                    page_start: dropped.page_start,
                    page_end: dropped.page_end,
                },
            );
        }

        if plan.segments.is_empty() {
            record_warning(ctx, progress, PipelineWarning::NoDocuments);
            return Ok(());
        }

        info!(segments = plan.segments.len(), "Segments planned");

        for draft in segmentation.drafts() {
            let draft = draft?;
            let _doc_span = info_span!("document", sequence = draft.sequence).entered();
            let stored = self.store_document(ctx, &draft)?;
            progress.report(ProgressEvent::DocumentStored {
                sequence: stored.sequence,
                filename: sanitize::redact_path(&stored.path),
                document_type: stored.document_type,
                page_start: stored.page_start,
                page_end: stored.page_end,
            });
            ctx.stored.push(stored);
        }

        Ok(())
    }

    /// Classifies a draft, writes its PDF, then records the row. The file
    /// exists before the row does.
    fn store_document(
        &self,
        ctx: &PipelineContext,
        draft: &SegmentDraft,
    ) -> Result<StoredDocument, PipelineError> {
        let document_type = classifier::classify(draft.barcode_value(), draft.ocr_text.as_deref());
        let base = file_stem(&ctx.job.filename);

        let path = self
            .store
            .store_segment(&ctx.job.job_id, &base, draft.sequence, &draft.pdf_bytes)?;

        let doc = NewDocument {
            job_id: ctx.job.job_id.clone(),
            filename: sanitize::redact_path(&path),
            file_path: path.display().to_string(),
            page_start: draft.page_start,
            page_end: draft.page_end,
            total_pages: draft.total_pages,
            barcode_value: draft.barcode.as_ref().map(|b| b.value.clone()),
            barcode_type: draft.barcode.as_ref().map(|b| b.symbology.clone()),
            document_type,
            ocr_excerpt: draft
                .ocr_text
                .as_deref()
                .map(|text| excerpt(text, self.config.ocr_excerpt_limit))
                .filter(|text| !text.is_empty()),
            blank_pages_skipped: draft.blank_pages_skipped,
            created_at: now_timestamp(),
        };
        let id = document_repo::insert(&self.db, &doc)?;

        info!(
            sequence = draft.sequence,
            document_type = %document_type,
            pages = draft.total_pages,
            "Document stored"
        );

        Ok(StoredDocument {
            id,
            sequence: draft.sequence,
            document_type,
            path,
            page_start: draft.page_start,
            page_end: draft.page_end,
        })
    }
}

fn source_bytes(ctx: &PipelineContext) -> Result<&[u8], PipelineError> {
    ctx.pdf_bytes
        .as_deref()
        .ok_or_else(|| PipelineError::SourceMissing(ctx.job.storage_path.clone()))
}

fn record_warning(
    ctx: &mut PipelineContext,
    progress: &dyn ProgressReporter,
    warning: PipelineWarning,
) {
    warn!("{}", warning);
    progress.report(ProgressEvent::Warning(warning.clone()));
    ctx.warnings.push(warning);
}

/// Artifact base name: the original file name without its extension.
fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}

fn excerpt(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
