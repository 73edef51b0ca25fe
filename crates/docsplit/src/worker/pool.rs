use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::worker::job::{JobResult, QueuedJob};
use crate::worker::orchestrator::{ClaimOutcome, JobOrchestrator};

/// What a worker reports back for each job it received.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Processed(JobResult),
    /// Another worker or process already claimed the job.
    NotClaimed { job_id: String },
    /// The job row could not be read or updated.
    Error { job_id: String, message: String },
}

impl WorkerEvent {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Processed(result) => &result.job_id,
            Self::NotClaimed { job_id } | Self::Error { job_id, .. } => job_id,
        }
    }
}

pub struct WorkerPool {
    job_sender: Sender<QueuedJob>,
    result_receiver: Receiver<WorkerEvent>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` threads (at least one) sharing one orchestrator.
    pub fn new(orchestrator: Arc<JobOrchestrator>, worker_count: usize) -> Result<Self, WorkerError> {
        let worker_count = worker_count.max(1);
        let (job_sender, job_receiver) = bounded::<QueuedJob>(worker_count * 2);
        let (result_sender, result_receiver) = bounded::<WorkerEvent>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_orchestrator = Arc::clone(&orchestrator);

            let handle = thread::Builder::new()
                .name(format!("docsplit-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(worker_id, job_rx, result_tx, shutdown_flag, worker_orchestrator);
                })
                .map_err(|e| {
                    shutdown.store(true, Ordering::Relaxed);
                    WorkerError::SpawnFailed(e.to_string())
                })?;

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            job_sender,
            result_receiver,
            workers,
            shutdown,
        })
    }

    /// Queues a job. Blocks while the queue is full.
    pub fn submit(&self, job: QueuedJob) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<WorkerEvent> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<WorkerEvent> {
        self.result_receiver.recv().ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);
        // Workers blocked on a full result channel must not deadlock the join.
        drop(self.result_receiver);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<QueuedJob>,
    result_sender: Sender<WorkerEvent>,
    shutdown: Arc<AtomicBool>,
    orchestrator: Arc<JobOrchestrator>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                debug!("Worker {} processing job {}", worker_id, job.job_id);

                let event = match orchestrator.process(&job) {
                    Ok(ClaimOutcome::Processed(result)) => WorkerEvent::Processed(result),
                    Ok(ClaimOutcome::NotClaimed) => WorkerEvent::NotClaimed {
                        job_id: job.job_id.clone(),
                    },
                    Err(e) => {
                        error!("Worker {} could not update job {}: {}", worker_id, job.job_id, e);
                        WorkerEvent::Error {
                            job_id: job.job_id.clone(),
                            message: e.to_string(),
                        }
                    }
                };

                if let Err(e) = result_sender.send(event) {
                    error!("Worker {} failed to send result: {}", worker_id, e);
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
