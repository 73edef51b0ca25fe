pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod segmenter;
pub mod storage;
pub mod worker;

pub use analyzer::{PageAnalyzer, PageSignal};
pub use classifier::{classify, DocumentType};
pub use config::{load_config, Config};
pub use db::Database;
pub use error::{ConfigError, DocsplitError, ProcessError, Result, StorageError, WorkerError};
pub use pipeline::{Pipeline, PipelineConfig, PipelineContext};
pub use segmenter::{SegmentDraft, Segmentation};
pub use worker::{JobOrchestrator, PendingJobPoller, WorkerPool};
