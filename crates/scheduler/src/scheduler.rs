//! Periodic execution of registered jobs on tokio intervals.

use crate::batch::BatchSummary;
use crate::jobs::Job;
use influencer_core::{EngineError, EngineResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    pub fn job_names(&self) -> Vec<&'static str> {
        self.jobs.iter().map(|j| j.name()).collect()
    }

    /// Runs a registered job once, outside its schedule.
    pub async fn run_once(&self, name: &str) -> EngineResult<BatchSummary> {
        let job = self
            .jobs
            .iter()
            .find(|j| j.name() == name)
            .ok_or_else(|| EngineError::not_found("job", name))?;
        execute(job.as_ref()).await
    }

    /// Spawns one task per job. The first run happens one interval after
    /// start.
    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_rx.clone();

            let handle = tokio::spawn(async move {
                let name = job.name();
                let mut interval = tokio::time::interval(job.interval());
                interval.tick().await;
                info!(job = name, interval_secs = job.interval().as_secs(), "Job scheduled");

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            if let Err(e) = execute(job.as_ref()).await {
                                error!(job = name, error = %e, "Job failed");
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                info!(job = name, "Job shutting down");
                                break;
                            }
                        }
                    }
                }
            });
            self.handles.push(handle);
        }
    }

    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Waits for the job tasks to exit, aborting any still running after
    /// `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        for handle in self.handles {
            let abort = handle.abort_handle();
            if tokio::time::timeout(timeout, handle).await.is_err() {
                warn!("Job did not stop in time, aborting");
                abort.abort();
            }
        }
        info!("Job scheduler stopped");
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn execute(job: &dyn Job) -> EngineResult<BatchSummary> {
    let name = job.name();
    let start = Instant::now();
    info!(job = name, "Job starting");
    let summary = job.run().await?;
    metrics::counter!("scheduler.runs", "job" => name).increment(1);
    info!(
        job = name,
        elapsed_ms = start.elapsed().as_millis() as u64,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Job completed"
    );
    Ok(summary)
}
