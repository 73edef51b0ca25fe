//! Builders for test data.
//!
//! Page images carry their 0-based index in the red channel of pixel (0, 0),
//! so the fake decoder and recognizer can look up what each page "shows"
//! without any real barcode or OCR engine.

#![allow(dead_code)]

use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::{dictionary, Document, Object, Stream};

use docsplit::config::{AnalysisConfig, Config, OcrConfig, OutputConfig};
use docsplit::error::ProcessError;
use docsplit::processor::{Barcode, BarcodeDecoder, PageRenderer, TextRecognizer};

/// What one rendered page contains.
#[derive(Debug, Clone)]
pub enum FakePage {
    Blank,
    Separator(&'static str),
    Text(&'static str),
    /// Content page whose OCR returns an error.
    BrokenOcr,
    /// Content page whose OCR panics.
    Panic,
}

/// Shorthand for a content page with text.
pub fn text(s: &'static str) -> FakePage {
    FakePage::Text(s)
}

/// Shorthand for a CODE-128 separator page.
pub fn sep(code: &'static str) -> FakePage {
    FakePage::Separator(code)
}

/// Builds an N-page PDF whose page `i` draws `Page {i + 1}`.
pub fn build_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = (0..page_count)
        .map(|i| {
            let content = format!("BT /F1 18 Tf 72 720 Td (Page {}) Tj ET", i + 1);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("Failed to serialize test PDF");
    buffer
}

/// Number of pages in a PDF produced by the pipeline.
pub fn pdf_page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes)
        .expect("Output is not a valid PDF")
        .get_pages()
        .len()
}

/// Text drawn on each page of a PDF, in page order.
pub fn pdf_page_labels(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).expect("Output is not a valid PDF");
    doc.get_pages()
        .values()
        .map(|id| {
            let content = doc.get_page_content(*id).expect("Page has no content");
            let content = String::from_utf8_lossy(&content);
            content
                .split('(')
                .nth(1)
                .and_then(|rest| rest.split(')').next())
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

fn page_index(image: &DynamicImage) -> usize {
    image.to_rgb8().get_pixel(0, 0).0[0] as usize
}

/// Scripted renderer, decoder and recognizer sharing one page list.
#[derive(Clone)]
pub struct ScriptedPages {
    pages: Arc<Vec<FakePage>>,
}

impl ScriptedPages {
    pub fn new(pages: &[FakePage]) -> Self {
        assert!(pages.len() < 256, "page index must fit the marker pixel");
        Self {
            pages: Arc::new(pages.to_vec()),
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, image: &DynamicImage) -> Option<&FakePage> {
        self.pages.get(page_index(image))
    }
}

impl PageRenderer for ScriptedPages {
    fn render(&self, _pdf_bytes: &[u8], _dpi: u32) -> Result<Vec<DynamicImage>, ProcessError> {
        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(i, page)| {
                let mut img = match page {
                    FakePage::Blank => RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])),
                    _ => RgbImage::from_pixel(8, 8, Rgb([20, 20, 20])),
                };
                // Blank pages keep a near-white marker so they stay blank.
                let marker = match page {
                    FakePage::Blank => Rgb([i as u8, 255, 255]),
                    _ => Rgb([i as u8, 20, 20]),
                };
                img.put_pixel(0, 0, marker);
                DynamicImage::ImageRgb8(img)
            })
            .collect())
    }
}

impl BarcodeDecoder for ScriptedPages {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, ProcessError> {
        Ok(match self.page(image) {
            Some(FakePage::Separator(code)) => vec![Barcode::new(*code, "CODE-128")],
            _ => Vec::new(),
        })
    }
}

impl TextRecognizer for ScriptedPages {
    fn recognize(&self, image: &DynamicImage, _language: &str) -> Result<String, ProcessError> {
        match self.page(image) {
            Some(FakePage::Text(text)) => Ok(text.to_string()),
            Some(FakePage::BrokenOcr) => Err(ProcessError::Ocr("engine unavailable".to_string())),
            Some(FakePage::Panic) => panic!("recognizer crashed"),
            _ => Ok(String::new()),
        }
    }
}

/// Builder for `Config` values rooted in a test directory.
pub struct ConfigBuilder {
    storage_root: String,
    max_upload_bytes: u64,
    blank_threshold: f64,
    page_parallelism: usize,
    ocr_excerpt_limit: usize,
}

impl ConfigBuilder {
    pub fn new(storage_root: &std::path::Path) -> Self {
        Self {
            storage_root: storage_root.display().to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            blank_threshold: 0.98,
            page_parallelism: 2,
            ocr_excerpt_limit: 1000,
        }
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn page_parallelism(mut self, threads: usize) -> Self {
        self.page_parallelism = threads;
        self
    }

    pub fn ocr_excerpt_limit(mut self, limit: usize) -> Self {
        self.ocr_excerpt_limit = limit;
        self
    }

    pub fn build(self) -> Config {
        Config {
            version: "1.0".to_string(),
            storage_root: self.storage_root,
            database_path: None,
            worker_count: 1,
            max_upload_bytes: self.max_upload_bytes,
            ocr: OcrConfig::default(),
            analysis: AnalysisConfig {
                blank_threshold: self.blank_threshold,
                page_parallelism: self.page_parallelism,
            },
            output: OutputConfig {
                ocr_excerpt_limit: self.ocr_excerpt_limit,
            },
            log_level: "info".to_string(),
        }
    }
}
