//! Black-box collaborators: page rendering, OCR, barcode decoding, and PDF
//! page assembly.

pub mod barcode;
pub mod ocr;
pub mod pdf;

pub use barcode::{Barcode, BarcodeDecoder, ZbarDecoder};
pub use ocr::{TesseractOcr, TextRecognizer};
pub use pdf::{PageRenderer, PdftoppmRenderer, SourceDocument};
