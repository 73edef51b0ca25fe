use std::io::Write;
use std::process::Command;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::ProcessError;
use crate::processor::ocr::encode_png;

/// A decoded barcode payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barcode {
    pub value: String,
    pub symbology: String,
}

impl Barcode {
    pub fn new(value: impl Into<String>, symbology: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            symbology: symbology.into(),
        }
    }
}

/// Finds barcodes on a rendered page.
///
/// Results come back in whatever order the underlying decoder reports them;
/// callers that need a single code take the first one.
pub trait BarcodeDecoder: Send + Sync {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, ProcessError>;
}

/// `zbarimg` exit status when the image was scanned but held no symbols.
const ZBAR_NO_SYMBOLS: i32 = 4;

/// Decodes barcodes by shelling out to `zbarimg` (zbar-tools).
pub struct ZbarDecoder {
    binary: String,
}

impl ZbarDecoder {
    pub fn new() -> Self {
        Self::with_binary("zbarimg")
    }

    pub fn with_binary(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl Default for ZbarDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BarcodeDecoder for ZbarDecoder {
    fn decode(&self, image: &DynamicImage) -> Result<Vec<Barcode>, ProcessError> {
        let _span = tracing::debug_span!("processor.barcode").entered();

        let png_data = encode_png(image)
            .map_err(|e| ProcessError::Barcode(format!("Failed to convert image: {}", e)))?;

        let mut temp = tempfile::Builder::new()
            .prefix("docsplit_page_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ProcessError::Barcode(format!("Failed to create temp image: {}", e)))?;
        temp.write_all(&png_data)
            .map_err(|e| ProcessError::Barcode(format!("Failed to write temp image: {}", e)))?;

        let output = Command::new(&self.binary)
            .arg("-q")
            .arg(temp.path())
            .output()
            .map_err(|e| {
                ProcessError::Barcode(format!(
                    "Failed to run {}: {}. Make sure zbar-tools is installed.",
                    self.binary, e
                ))
            })?;

        match output.status.code() {
            Some(0) => Ok(parse_zbar_output(&String::from_utf8_lossy(&output.stdout))),
            Some(ZBAR_NO_SYMBOLS) => Ok(Vec::new()),
            _ => Err(ProcessError::Barcode(format!(
                "{} failed: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

/// Parses `zbarimg` output lines of the form `SYMBOLOGY:value`.
fn parse_zbar_output(stdout: &str) -> Vec<Barcode> {
    stdout
        .lines()
        .filter_map(|line| {
            let (symbology, value) = line.split_once(':')?;
            if symbology.is_empty() || value.is_empty() {
                return None;
            }
            Some(Barcode::new(value, symbology))
        })
        .collect()
}
