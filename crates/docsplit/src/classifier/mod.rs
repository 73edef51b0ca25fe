//! Maps a segment's barcode and OCR text to a [`DocumentType`].

pub mod rules;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use rules::{BARCODE_RULES, OCR_KEYWORDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Cedula,
    Certificado,
    PapeletaVotacion,
    Mecanizado,
    PlanillaServicios,
    CertificadoCuenta,
    Unknown,
}

impl DocumentType {
    pub const ALL: [DocumentType; 7] = [
        Self::Cedula,
        Self::Certificado,
        Self::PapeletaVotacion,
        Self::Mecanizado,
        Self::PlanillaServicios,
        Self::CertificadoCuenta,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cedula => "CEDULA",
            Self::Certificado => "CERTIFICADO",
            Self::PapeletaVotacion => "PAPELETA_VOTACION",
            Self::Mecanizado => "MECANIZADO",
            Self::PlanillaServicios => "PLANILLA_SERVICIOS",
            Self::CertificadoCuenta => "CERTIFICADO_CUENTA",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown document type: {0}")]
pub struct ParseDocumentTypeError(pub String);

impl FromStr for DocumentType {
    type Err = ParseDocumentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| ParseDocumentTypeError(s.to_string()))
    }
}

/// Classifies a segment. The barcode decides when one of its rules matches;
/// otherwise the OCR text is consulted. Empty inputs count as absent.
pub fn classify(barcode_value: Option<&str>, ocr_text: Option<&str>) -> DocumentType {
    let barcode_value = barcode_value.filter(|v| !v.trim().is_empty());
    let ocr_text = ocr_text.filter(|t| !t.trim().is_empty());

    barcode_value
        .and_then(|value| rules::first_match(BARCODE_RULES, value))
        .or_else(|| ocr_text.and_then(|text| rules::first_match(OCR_KEYWORDS, text)))
        .unwrap_or(DocumentType::Unknown)
}
