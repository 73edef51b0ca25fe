//! Test harness for isolated execution.
//!
//! Each `TestHarness` owns a temporary storage root (input and output
//! directories live below it) and an in-memory database. Pipelines built by
//! the harness use scripted collaborators instead of poppler, zbar and
//! Tesseract.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use docsplit::config::Config;
use docsplit::db::job_repo;
use docsplit::db::Database;
use docsplit::pipeline::{Pipeline, PipelineConfig};
use docsplit::worker::{intake, JobOrchestrator, QueuedJob};

use super::builders::{build_pdf, ConfigBuilder, FakePage, ScriptedPages};

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: Config,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(|builder| builder)
    }

    /// Creates a harness after letting the caller adjust the config.
    pub fn with_config(customize: impl FnOnce(ConfigBuilder) -> ConfigBuilder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = customize(ConfigBuilder::new(temp_dir.path())).build();
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        Self {
            temp_dir,
            config,
            db,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_directory()
    }

    /// Uploads a synthetic PDF with `page_count` pages through intake.
    pub fn submit_pdf(&self, filename: &str, page_count: usize) -> QueuedJob {
        intake::submit(&self.db, &self.config, filename, &build_pdf(page_count))
            .expect("Failed to submit test PDF")
    }

    /// Creates a PENDING job whose source file was never written.
    pub fn submit_missing(&self, job_id: &str) -> QueuedJob {
        let storage_path = self
            .config
            .input_directory()
            .join(format!("{}_missing.pdf", job_id));
        job_repo::insert_pending(
            &self.db,
            job_id,
            "missing.pdf",
            &storage_path.display().to_string(),
            &docsplit::db::now_timestamp(),
        )
        .expect("Failed to insert job");
        QueuedJob {
            job_id: job_id.to_string(),
            filename: "missing.pdf".to_string(),
            storage_path,
        }
    }

    pub fn pipeline(&self, pages: &[FakePage]) -> Pipeline {
        let scripted = ScriptedPages::new(pages);
        Pipeline::with_collaborators(
            Arc::new(PipelineConfig::from_config(&self.config)),
            self.db.clone(),
            Arc::new(scripted.clone()),
            Arc::new(scripted.clone()),
            Arc::new(scripted),
        )
    }

    pub fn orchestrator(&self, pages: &[FakePage]) -> JobOrchestrator {
        JobOrchestrator::new(self.db.clone(), Arc::new(self.pipeline(pages)))
    }

    /// Files written for `job_id`, sorted by name.
    pub fn artifacts(&self, job_id: &str) -> Vec<PathBuf> {
        let dir = self.output_dir().join(job_id);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        files.sort();
        files
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
