use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::db::{job_repo, Database, DatabaseError};
use crate::worker::job::QueuedJob;
use crate::worker::pool::{WorkerEvent, WorkerPool};

/// Feeds PENDING jobs from the database into a [`WorkerPool`].
///
/// A job stays in the in-flight set from submission until its worker
/// reports back, so one poll cycle never queues it twice. Duplicates across
/// processes are resolved by the claim.
pub struct PendingJobPoller {
    db: Database,
    interval: Duration,
    batch_size: u64,
    in_flight: HashSet<String>,
}

impl PendingJobPoller {
    pub fn new(db: Database, interval: Duration, batch_size: u64) -> Self {
        Self {
            db,
            interval,
            batch_size: batch_size.max(1),
            in_flight: HashSet::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Submits every PENDING job not already in flight. Returns how many
    /// were submitted.
    pub fn poll_once(&mut self, pool: &WorkerPool) -> Result<usize, DatabaseError> {
        let pending = job_repo::list_pending(&self.db, self.batch_size)?;
        let mut submitted = 0;

        for row in pending {
            if self.in_flight.contains(&row.job_id) {
                continue;
            }
            let job = QueuedJob::from_row(&row);
            let job_id = job.job_id.clone();
            if let Err(e) = pool.submit(job) {
                warn!("Could not submit job {}: {}", job_id, e);
                break;
            }
            debug!("Submitted job {}", job_id);
            self.in_flight.insert(job_id);
            submitted += 1;
        }

        Ok(submitted)
    }

    /// Collects finished jobs without blocking and logs their outcome.
    pub fn drain_results(&mut self, pool: &WorkerPool) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        while let Some(event) = pool.try_recv_result() {
            self.in_flight.remove(event.job_id());
            match &event {
                WorkerEvent::Processed(result) if result.is_success() => info!(
                    "Job {} completed: {} documents",
                    result.job_id, result.documents_created
                ),
                WorkerEvent::Processed(result) => warn!(
                    "Job {} failed: {}",
                    result.job_id,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
                WorkerEvent::NotClaimed { job_id } => debug!("Job {} was claimed elsewhere", job_id),
                WorkerEvent::Error { job_id, message } => {
                    error!("Job {} could not be recorded: {}", job_id, message)
                }
            }
            events.push(event);
        }
        events
    }

    /// Polls until `shutdown` is set.
    pub fn run(&mut self, pool: &WorkerPool, shutdown: &AtomicBool) {
        info!("Polling for pending jobs every {:?}", self.interval);
        let tick = Duration::from_millis(100).min(self.interval);

        while !shutdown.load(Ordering::Relaxed) {
            self.drain_results(pool);
            if let Err(e) = self.poll_once(pool) {
                error!("Failed to list pending jobs: {}", e);
            }

            let mut waited = Duration::ZERO;
            while waited < self.interval && !shutdown.load(Ordering::Relaxed) {
                std::thread::sleep(tick);
                waited += tick;
                self.drain_results(pool);
            }
        }

        info!("Poller stopped with {} job(s) in flight", self.in_flight.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::job_repo::JobStatus;
    use crate::pipeline::{Pipeline, PipelineConfig};
    use crate::worker::orchestrator::JobOrchestrator;
    use std::sync::Arc;
    use std::time::Instant;
    use tempfile::TempDir;

    fn pool_for(db: &Database, output_dir: &std::path::Path) -> WorkerPool {
        let config = Arc::new(PipelineConfig {
            output_directory: output_dir.to_path_buf(),
            ocr_language: "spa".to_string(),
            ocr_dpi: 300,
            tessdata_dir: None,
            blank_threshold: 0.98,
            page_parallelism: 1,
            ocr_excerpt_limit: 1000,
        });
        let pipeline = Arc::new(Pipeline::from_config(config, db.clone()));
        WorkerPool::new(Arc::new(JobOrchestrator::new(db.clone(), pipeline)), 1).unwrap()
    }

    fn drain_until(poller: &mut PendingJobPoller, pool: &WorkerPool, n: usize) -> Vec<WorkerEvent> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        while events.len() < n && Instant::now() < deadline {
            events.extend(poller.drain_results(pool));
            std::thread::sleep(Duration::from_millis(10));
        }
        events
    }

    #[test]
    fn test_poll_once_submits_pending_jobs_once() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let missing = tmp.path().join("missing.pdf").display().to_string();
        job_repo::insert_pending(&db, "job_aaaaaaaaaaaa", "a.pdf", &missing, "2026-01-01T00:00:00.000000Z")
            .unwrap();

        let pool = pool_for(&db, &tmp.path().join("output"));
        let mut poller = PendingJobPoller::new(db.clone(), Duration::from_millis(50), 10);

        assert_eq!(poller.poll_once(&pool).unwrap(), 1);
        assert_eq!(poller.in_flight(), 1);
        assert_eq!(poller.poll_once(&pool).unwrap(), 0);

        let events = drain_until(&mut poller, &pool, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].job_id(), "job_aaaaaaaaaaaa");
        assert_eq!(poller.in_flight(), 0);

        let row = job_repo::get(&db, "job_aaaaaaaaaaaa").unwrap();
        assert_eq!(row.status, JobStatus::Failed);

        // Terminal jobs are no longer listed.
        assert_eq!(poller.poll_once(&pool).unwrap(), 0);

        pool.shutdown();
        pool.wait();
    }

    #[test]
    fn test_run_stops_when_shutdown_is_set() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let pool = pool_for(&db, tmp.path());
        let mut poller = PendingJobPoller::new(db, Duration::from_millis(20), 10);

        let shutdown = AtomicBool::new(true);
        poller.run(&pool, &shutdown);
        assert_eq!(poller.in_flight(), 0);

        pool.shutdown();
        pool.wait();
    }
}
