pub mod intake;
pub mod job;
pub mod orchestrator;
pub mod poller;
pub mod pool;

pub use intake::{submit, IntakeError};
pub use job::{format_processing_time, generate_job_id, JobResult, QueuedJob};
pub use orchestrator::{ClaimOutcome, JobOrchestrator, MAX_ERROR_MESSAGE_CHARS};
pub use poller::PendingJobPoller;
pub use pool::{WorkerEvent, WorkerPool};
