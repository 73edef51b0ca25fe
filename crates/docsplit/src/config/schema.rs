use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub storage_root: String,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Directory where accepted uploads are written.
    pub fn input_directory(&self) -> PathBuf {
        PathBuf::from(&self.storage_root).join("input")
    }

    /// Directory under which every job gets its own artifact folder.
    pub fn output_directory(&self) -> PathBuf {
        PathBuf::from(&self.storage_root).join("output")
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.storage_root).join("docsplit.db"),
        }
    }
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_max_upload_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Custom tessdata directory; Tesseract's own lookup is used when unset.
    #[serde(default)]
    pub tessdata_dir: Option<String>,
}

fn default_language() -> String {
    "spa".to_string()
}

fn default_dpi() -> u32 {
    300
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            dpi: default_dpi(),
            tessdata_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum ratio of near-white pixels for a page to count as blank.
    #[serde(default = "default_blank_threshold")]
    pub blank_threshold: f64,
    /// Number of threads used to analyze the pages of one job.
    #[serde(default = "default_page_parallelism")]
    pub page_parallelism: usize,
}

fn default_blank_threshold() -> f64 {
    0.98
}

fn default_page_parallelism() -> usize {
    num_cpus::get()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            blank_threshold: default_blank_threshold(),
            page_parallelism: default_page_parallelism(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Maximum number of OCR characters kept on a document row.
    #[serde(default = "default_ocr_excerpt_limit")]
    pub ocr_excerpt_limit: usize,
}

fn default_ocr_excerpt_limit() -> usize {
    1000
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ocr_excerpt_limit: default_ocr_excerpt_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"version": "1.0", "storage_root": "/srv/docsplit"}"#)
                .unwrap();

        assert_eq!(config.ocr.language, "spa");
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.analysis.blank_threshold, 0.98);
        assert!(config.analysis.page_parallelism >= 1);
        assert_eq!(config.output.ocr_excerpt_limit, 1000);
        assert_eq!(config.max_upload_bytes, 104_857_600);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_derived_directories() {
        let config: Config =
            serde_json::from_str(r#"{"version": "1.0", "storage_root": "/srv/docsplit"}"#)
                .unwrap();

        assert_eq!(config.input_directory(), PathBuf::from("/srv/docsplit/input"));
        assert_eq!(
            config.output_directory(),
            PathBuf::from("/srv/docsplit/output")
        );
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/docsplit/docsplit.db")
        );
    }

    #[test]
    fn test_explicit_database_path() {
        let config: Config = serde_json::from_str(
            r#"{"version": "1.0", "storage_root": "/srv/docsplit", "database_path": "/var/lib/ds.db"}"#,
        )
        .unwrap();

        assert_eq!(config.database_path(), PathBuf::from("/var/lib/ds.db"));
    }
}
