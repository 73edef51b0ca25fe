use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;

use crate::error::ProcessError;

/// Rasterizes every page of a PDF, in page order.
pub trait PageRenderer: Send + Sync {
    fn render(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, ProcessError>;
}

/// Renders pages with poppler's `pdfinfo` and `pdftoppm`.
pub struct PdftoppmRenderer;

impl PdftoppmRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn render(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, ProcessError> {
        let _span = tracing::info_span!("processor.render", dpi).entered();

        let work_dir = tempfile::Builder::new()
            .prefix("docsplit_render_")
            .tempdir()
            .map_err(|e| ProcessError::Render(format!("Failed to create temp dir: {}", e)))?;

        let pdf_path = work_dir.path().join("source.pdf");
        std::fs::write(&pdf_path, pdf_bytes)
            .map_err(|e| ProcessError::Render(format!("Failed to write temp PDF: {}", e)))?;

        let page_count = count_pdf_pages(&pdf_path)?;
        let output_prefix = work_dir.path().join("page");

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(&pdf_path)
            .arg(&output_prefix)
            .output()
            .map_err(|e| {
                ProcessError::Render(format!(
                    "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ProcessError::Render(format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let image_paths = collect_rendered_pages(work_dir.path())?;
        if image_paths.len() != page_count {
            return Err(ProcessError::Render(format!(
                "Expected {} rendered pages, found {}",
                page_count,
                image_paths.len()
            )));
        }

        let mut images = Vec::with_capacity(image_paths.len());
        for path in &image_paths {
            let img = image::open(path).map_err(|e| {
                ProcessError::Render(format!(
                    "Failed to load rendered page {}: {}",
                    path.display(),
                    e
                ))
            })?;
            images.push(img);
        }

        tracing::info!(pages = images.len(), "Rendered PDF to images");
        Ok(images)
    }
}

/// Get the page count of a PDF using pdfinfo (poppler-utils).
fn count_pdf_pages(pdf_path: &Path) -> Result<usize, ProcessError> {
    let output = Command::new("pdfinfo").arg(pdf_path).output().map_err(|e| {
        ProcessError::Render(format!(
            "Failed to run pdfinfo: {}. Make sure poppler-utils is installed.",
            e
        ))
    })?;

    if !output.status.success() {
        return Err(ProcessError::Render(format!(
            "pdfinfo failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_page_count(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| ProcessError::Render("pdfinfo did not report a page count".to_string()))
}

fn parse_page_count(pdfinfo_stdout: &str) -> Option<usize> {
    pdfinfo_stdout
        .lines()
        .filter_map(|line| line.strip_prefix("Pages:"))
        .find_map(|count| count.trim().parse::<usize>().ok())
}

/// Lists `page-N.png` files in page order. pdftoppm zero-pads `N` to the
/// width of the last page number, so sorting is numeric, not lexical.
fn collect_rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ProcessError::Render(format!("Failed to list rendered pages: {}", e)))?;

    let mut pages: Vec<(usize, PathBuf)> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter_map(|path| {
            let number = rendered_page_number(&path)?;
            Some((number, path))
        })
        .collect();

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn rendered_page_number(path: &Path) -> Option<usize> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("page-")?.parse().ok()
}

/// The parsed source PDF, used to copy page subsets into new documents.
pub struct SourceDocument {
    doc: lopdf::Document,
}

impl SourceDocument {
    pub fn load(pdf_bytes: &[u8]) -> Result<Self, ProcessError> {
        let doc = lopdf::Document::load_mem(pdf_bytes)
            .map_err(|e| ProcessError::PdfAssembly(format!("Failed to load PDF: {}", e)))?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Builds a standalone PDF holding only the given pages (0-based
    /// indices), in source order.
    pub fn extract_pages(&self, page_indices: &[usize]) -> Result<Vec<u8>, ProcessError> {
        let total = self.page_count();
        if page_indices.is_empty() {
            return Err(ProcessError::PdfAssembly(
                "Cannot build a document without pages".to_string(),
            ));
        }
        if let Some(&out_of_range) = page_indices.iter().find(|&&idx| idx >= total) {
            return Err(ProcessError::PdfAssembly(format!(
                "Page index {} out of range for {} pages",
                out_of_range, total
            )));
        }

        let keep: BTreeSet<u32> = page_indices.iter().map(|&idx| idx as u32 + 1).collect();
        let to_delete: Vec<u32> = (1..=total as u32)
            .filter(|page| !keep.contains(page))
            .collect();

        let mut doc = self.doc.clone();
        if !to_delete.is_empty() {
            doc.delete_pages(&to_delete);
        }
        doc.prune_objects();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ProcessError::PdfAssembly(e.to_string()))?;

        Ok(buffer)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::build_pdf;
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let stdout = "Producer:       test\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(stdout), Some(12));
        assert_eq!(parse_page_count("Producer: x\n"), None);
    }

    #[test]
    fn test_rendered_page_number() {
        assert_eq!(rendered_page_number(Path::new("/t/page-1.png")), Some(1));
        assert_eq!(rendered_page_number(Path::new("/t/page-007.png")), Some(7));
        assert_eq!(rendered_page_number(Path::new("/t/source.pdf")), None);
        assert_eq!(rendered_page_number(Path::new("/t/other-1.png")), None);
    }

    #[test]
    fn test_collect_rendered_pages_sorts_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-1.png", "source.pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let pages = collect_rendered_pages(dir.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-02.png", "page-10.png"]);
    }

    #[test]
    fn test_source_document_page_count() {
        let source = SourceDocument::load(&build_pdf(5)).unwrap();
        assert_eq!(source.page_count(), 5);
    }

    #[test]
    fn test_extract_pages_keeps_only_requested() {
        let source = SourceDocument::load(&build_pdf(6)).unwrap();
        let bytes = source.extract_pages(&[1, 2, 4]).unwrap();

        let extracted = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(extracted.get_pages().len(), 3);
        let first_page = *extracted.get_pages().get(&1).unwrap();
        let content = extracted.get_page_content(first_page).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(Page 2)"));
    }

    #[test]
    fn test_extract_all_pages() {
        let source = SourceDocument::load(&build_pdf(3)).unwrap();
        let bytes = source.extract_pages(&[0, 1, 2]).unwrap();
        let extracted = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(extracted.get_pages().len(), 3);
    }

    #[test]
    fn test_extract_pages_rejects_out_of_range() {
        let source = SourceDocument::load(&build_pdf(2)).unwrap();
        match source.extract_pages(&[0, 2]) {
            Err(ProcessError::PdfAssembly(msg)) => assert!(msg.contains("out of range")),
            other => panic!("Expected PdfAssembly error, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_extract_pages_rejects_empty_selection() {
        let source = SourceDocument::load(&build_pdf(2)).unwrap();
        assert!(source.extract_pages(&[]).is_err());
    }

    #[test]
    fn test_load_invalid_pdf() {
        match SourceDocument::load(b"not a valid pdf") {
            Err(ProcessError::PdfAssembly(msg)) => assert!(msg.contains("Failed to load PDF")),
            _ => panic!("Expected PdfAssembly error"),
        }
    }
}
