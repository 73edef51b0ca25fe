use super::DocumentType;

/// Ordered rule table: the first row with a matching keyword wins.
pub type RuleTable = [(DocumentType, &'static [&'static str])];

/// Keywords looked up in the separator's barcode value.
pub static BARCODE_RULES: &RuleTable = &[
    (DocumentType::Cedula, &["CEDULA", "CED"]),
    (DocumentType::Certificado, &["CERTIFICADO", "CERT"]),
    (DocumentType::PapeletaVotacion, &["PAPELETA", "VOTACION"]),
    (DocumentType::Mecanizado, &["MECANIZADO", "MEC"]),
    (DocumentType::PlanillaServicios, &["PLANILLA", "SERVICIOS"]),
    (DocumentType::CertificadoCuenta, &["CUENTA"]),
];

/// Keywords looked up in the OCR text when the barcode gave no answer.
pub static OCR_KEYWORDS: &RuleTable = &[
    (DocumentType::Cedula, &["CEDULA", "IDENTIDAD", "REGISTRO CIVIL"]),
    (DocumentType::Certificado, &["CERTIFICADO", "CERTIFICA"]),
    (
        DocumentType::PapeletaVotacion,
        &["PAPELETA", "VOTACION", "ELECTORAL"],
    ),
    (DocumentType::Mecanizado, &["MECANIZADO", "IESS"]),
    (
        DocumentType::PlanillaServicios,
        &["PLANILLA", "SERVICIOS", "LUZ", "AGUA"],
    ),
    (
        DocumentType::CertificadoCuenta,
        &["CERTIFICADO", "CUENTA", "BANCARIO", "BANCO"],
    ),
];

/// Case-insensitive substring match of `text` against `table`, in order.
pub fn first_match(table: &RuleTable, text: &str) -> Option<DocumentType> {
    let haystack = text.to_uppercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(doc_type, _)| *doc_type)
}
