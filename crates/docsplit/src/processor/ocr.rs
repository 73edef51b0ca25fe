use std::io::Cursor;
use std::sync::Arc;

use image::DynamicImage;

use crate::error::ProcessError;

/// Best-effort text recognition over one rendered page.
///
/// `language` is a Tesseract language spec such as `spa` or `spa+eng`.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, ProcessError>;
}

#[derive(Clone)]
pub struct TesseractOcr {
    inner: Arc<TesseractOcrInner>,
}

struct TesseractOcrInner {
    /// Overrides the tessdata directory; Tesseract's default lookup is used
    /// when unset.
    data_path: Option<String>,
}

impl TesseractOcr {
    pub fn new(data_path: Option<&str>) -> Self {
        Self {
            inner: Arc::new(TesseractOcrInner {
                data_path: data_path
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            }),
        }
    }

    pub fn data_path(&self) -> Option<&str> {
        self.inner.data_path.as_deref()
    }

    pub fn recognize_png(&self, png_data: &[u8], language: &str) -> Result<String, ProcessError> {
        let _span = tracing::debug_span!("processor.ocr", language).entered();

        // LepTess is not Sync, so each call gets its own instance.
        let mut lt = leptess::LepTess::new(self.inner.data_path.as_deref(), language)
            .map_err(|e| ProcessError::Ocr(format!("Failed to initialize Tesseract: {}", e)))?;

        lt.set_image_from_mem(png_data)
            .map_err(|e| ProcessError::Ocr(format!("Failed to set image for OCR: {}", e)))?;

        let text = lt
            .get_utf8_text()
            .map_err(|e| ProcessError::Ocr(format!("OCR failed: {}", e)))?;

        Ok(text)
    }
}

impl TextRecognizer for TesseractOcr {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, ProcessError> {
        let png_data = encode_png(image)
            .map_err(|e| ProcessError::Ocr(format!("Failed to convert image: {}", e)))?;
        self.recognize_png(&png_data, language)
    }
}

/// Encodes a page image as PNG in memory, the format both Tesseract and
/// `zbarimg` accept.
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut png_data = Vec::new();
    image.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)?;
    Ok(png_data)
}
