use std::path::PathBuf;

use crate::analyzer::AnalyzerConfig;
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_directory: PathBuf,
    pub ocr_language: String,
    pub ocr_dpi: u32,
    pub tessdata_dir: Option<String>,
    pub blank_threshold: f64,
    pub page_parallelism: usize,
    pub ocr_excerpt_limit: usize,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_directory: config.output_directory(),
            ocr_language: config.ocr.language.clone(),
            ocr_dpi: config.ocr.dpi,
            tessdata_dir: config.ocr.tessdata_dir.clone(),
            blank_threshold: config.analysis.blank_threshold,
            page_parallelism: config.analysis.page_parallelism,
            ocr_excerpt_limit: config.output.ocr_excerpt_limit,
        }
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            blank_threshold: self.blank_threshold,
            ocr_language: self.ocr_language.clone(),
            parallelism: self.page_parallelism.max(1),
        }
    }
}
