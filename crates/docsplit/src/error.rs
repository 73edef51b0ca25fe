use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocsplitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Intake error: {0}")]
    Intake(#[from] crate::worker::intake::IntakeError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Failures of the external collaborators (renderer, OCR, barcode decoder)
/// and of PDF page assembly.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to read document '{}': {source}", crate::sanitize::redact_path(.path))]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render PDF: {0}")]
    Render(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Barcode decoding failed: {0}")]
    Barcode(String),

    #[error("Failed to assemble PDF: {0}")]
    PdfAssembly(String),
}

/// Display names only the final path component; `Debug` keeps the full path.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{}': {source}", crate::sanitize::redact_path(.path))]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{}': {source}", crate::sanitize::redact_path(.path))]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {}", crate::sanitize::redact_path(.0))]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, DocsplitError>;
