//! Download worker implementation.
//!
//! A single poll loop claims at most one job per tick and hands it to a
//! spawned handler:
//! - `Added`: fetch the source and move it to the target path
//! - `Downloaded`: transcode the target in place
//! - `Failed`: re-report the failure, cancel if the item is gone
//!
//! Every handler reports the new item status to the status sink and then
//! releases the job with its new status in a single queue update.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::fetcher::FileFetcher;
use crate::files::{move_file, FileSize, TempPath};
use crate::items::{ItemError, ItemStatus, StatusSink};
use crate::metrics;
use crate::queue::{Job, JobQueue, JobStatus, QueueError};
use crate::transcoder::MediaTranscoder;

use super::config::WorkerConfig;
use super::ticker::{IntervalTicker, Ticker};
use super::types::{Stage, StageOutcome, WorkerError};

/// Drives jobs from the queue through fetch and transcode.
#[derive(Clone)]
pub struct DownloadWorker {
    queue: Arc<dyn JobQueue>,
    sink: Arc<dyn StatusSink>,
    fetcher: Arc<dyn FileFetcher>,
    transcoder: Arc<dyn MediaTranscoder>,
    download_timeout: Duration,
    transcode_timeout: Duration,
    slots: Option<Arc<Semaphore>>,
}

impl DownloadWorker {
    /// Create a new worker.
    pub fn new(
        config: &WorkerConfig,
        queue: Arc<dyn JobQueue>,
        sink: Arc<dyn StatusSink>,
        fetcher: Arc<dyn FileFetcher>,
        transcoder: Arc<dyn MediaTranscoder>,
    ) -> Self {
        let slots = (config.max_in_flight > 0)
            .then(|| Arc::new(Semaphore::new(config.max_in_flight)));

        Self {
            queue,
            sink,
            fetcher,
            transcoder,
            download_timeout: config.download_timeout(),
            transcode_timeout: config.transcode_timeout(),
            slots,
        }
    }

    /// Run the poll loop on a fixed interval until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken, poll_interval: Duration) {
        info!(
            "Starting download worker with poll interval {:?}",
            poll_interval
        );
        self.run_with_ticker(cancel, IntervalTicker::new(poll_interval))
            .await;
    }

    /// Run the poll loop, claiming one job per tick, until `cancel` fires.
    ///
    /// Handlers still running at cancellation observe the same token and
    /// stop; this returns once all of them have exited.
    pub async fn run_with_ticker<T: Ticker>(&self, cancel: CancellationToken, mut ticker: T) {
        match self.reset_stale_jobs() {
            Ok(count) => debug!("Crash recovery released {} claims", count),
            Err(e) => error!("Failed to reset stale jobs: {}", e),
        }

        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Download worker received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    reap(&mut tasks);
                    self.poll(&mut tasks, &cancel);
                }
            }
        }

        if !tasks.is_empty() {
            info!("Waiting for {} in-flight handlers", tasks.len());
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!("Job handler task failed: {}", e);
            }
        }
        info!("Download worker stopped");
    }

    /// Release every claim left behind by a previous run.
    ///
    /// Each stored job is rewritten with `active = false` and its status
    /// unchanged. Returns the number of jobs that were still claimed.
    pub fn reset_stale_jobs(&self) -> Result<usize, WorkerError> {
        info!("Resetting stale jobs");

        let jobs = self.queue.all()?;
        let mut released = 0;
        for job in jobs {
            let was_claimed = job.active;
            let item_id = job.item_id.clone();
            self.queue
                .update(&job.released())
                .map_err(|source| WorkerError::Reset { item_id, source })?;

            if was_claimed {
                released += 1;
                metrics::STALE_JOBS_RESET.inc();
            }
        }

        info!("Reset {} stale jobs", released);
        Ok(released)
    }

    /// One tick: claim at most one job and spawn its handler.
    fn poll(&self, tasks: &mut JoinSet<()>, cancel: &CancellationToken) {
        let permit = match &self.slots {
            Some(slots) => match Arc::clone(slots).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    debug!("All handler slots busy, skipping tick");
                    return;
                }
            },
            None => None,
        };

        let job = match self.queue.next() {
            Ok(job) => job,
            Err(QueueError::NoInactiveJobs) => return,
            Err(e) => {
                warn!("Failed to get next job: {}", e);
                return;
            }
        };

        metrics::JOBS_CLAIMED
            .with_label_values(&[job.status.as_str()])
            .inc();
        debug!("Claimed job {} ({})", job.item_id, job.status);

        let worker = self.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let item_id = job.item_id.clone();
            let status = job.status;

            metrics::HANDLERS_IN_FLIGHT.inc();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        "Handler for job {} ({}) interrupted by shutdown, claim left for recovery",
                        item_id, status
                    );
                }
                _ = worker.dispatch(job) => {}
            }
            metrics::HANDLERS_IN_FLIGHT.dec();
        });
    }

    async fn dispatch(&self, job: Job) {
        match job.status {
            JobStatus::Added => self.handle_download(job).await,
            JobStatus::Downloaded => self.handle_conversion(job).await,
            JobStatus::Failed => self.handle_failure(job).await,
            JobStatus::Ready | JobStatus::Cancelled => {
                error!(
                    "Unexpected job status {} (job id {}), skipping",
                    job.status, job.item_id
                );
            }
        }
    }

    async fn handle_download(&self, job: Job) {
        let start = Instant::now();
        info!("Downloading {}", job.source_uri);

        let outcome = match self.download(&job).await {
            Ok(written) => {
                info!(
                    "Downloaded {} to {} ({} written)",
                    job.source_uri,
                    job.target_uri,
                    FileSize(written)
                );
                metrics::BYTES_DOWNLOADED.inc_by(written);
                StageOutcome::new(JobStatus::Downloaded, ItemStatus::Downloaded)
                    .with_content_length(written)
            }
            Err(e) => {
                warn!("Failed to download {}: {}", job.source_uri, e);
                StageOutcome::failed()
            }
        };

        self.finish(Stage::Download, job, outcome, start).await;
    }

    async fn download(&self, job: &Job) -> Result<u64, WorkerError> {
        let work = async {
            let fetched = self.fetcher.fetch(&job.source_uri).await?;
            let temp = TempPath::new(fetched.path);
            move_file(temp.path(), Path::new(&job.target_uri)).await?;
            Ok::<_, WorkerError>(fetched.bytes_written)
        };

        tokio::time::timeout(self.download_timeout, work)
            .await
            .map_err(|_| WorkerError::Timeout {
                stage: Stage::Download,
                secs: self.download_timeout.as_secs(),
            })?
    }

    async fn handle_conversion(&self, job: Job) {
        let start = Instant::now();
        info!("Transcoding {}", job.target_uri);

        let outcome = match self.transcode(&job).await {
            Ok(size) => {
                info!(
                    "Transcoded {} (new size {}) with {}",
                    job.target_uri,
                    FileSize(size),
                    self.transcoder.name()
                );
                StageOutcome::new(JobStatus::Ready, ItemStatus::Ready).with_content_length(size)
            }
            Err(e) => {
                warn!("Failed to transcode {}: {}", job.target_uri, e);
                StageOutcome::failed()
            }
        };

        self.finish(Stage::Conversion, job, outcome, start).await;
    }

    async fn transcode(&self, job: &Job) -> Result<u64, WorkerError> {
        let path = Path::new(&job.target_uri);
        let size = tokio::time::timeout(self.transcode_timeout, self.transcoder.transcode(path))
            .await
            .map_err(|_| WorkerError::Timeout {
                stage: Stage::Conversion,
                secs: self.transcode_timeout.as_secs(),
            })??;
        Ok(size)
    }

    /// A failed job claimed again. It is only cancelled when its item is gone;
    /// otherwise it stays claimed until an operator retries it.
    async fn handle_failure(&self, job: Job) {
        match self
            .sink
            .update_status(&job.item_id, ItemStatus::DownloadFailed)
        {
            Err(ItemError::NotFound(_)) => {
                info!("Podcast item {} was deleted, cancelling job", job.item_id);
                metrics::HANDLER_OUTCOMES
                    .with_label_values(&[Stage::Failure.as_str(), JobStatus::Cancelled.as_str()])
                    .inc();
                discard_target(&job).await;
                self.release(job.with_status(JobStatus::Cancelled));
            }
            Err(e) => {
                warn!(
                    "Failed to report failure of {} to the item store: {}",
                    job.item_id, e
                );
            }
            Ok(_) => {
                info!("Ignoring failed job {}", job.item_id);
                metrics::HANDLER_OUTCOMES
                    .with_label_values(&[Stage::Failure.as_str(), JobStatus::Failed.as_str()])
                    .inc();
            }
        }
    }

    /// Report the outcome to the sink and persist the job with the status
    /// that results.
    async fn finish(&self, stage: Stage, mut job: Job, outcome: StageOutcome, start: Instant) {
        job.status = self.report_status(&job.item_id, outcome);
        if job.status == JobStatus::Cancelled {
            discard_target(&job).await;
        }

        metrics::HANDLER_OUTCOMES
            .with_label_values(&[stage.as_str(), job.status.as_str()])
            .inc();
        metrics::HANDLER_DURATION
            .with_label_values(&[stage.as_str()])
            .observe(start.elapsed().as_secs_f64());

        self.release(job);
    }

    /// Propagate an outcome to the status sink. A deleted item turns the job
    /// into `Cancelled`; any other sink error turns it into `Failed`.
    fn report_status(&self, item_id: &str, outcome: StageOutcome) -> JobStatus {
        let reported = self
            .sink
            .update_status(item_id, outcome.item_status)
            .and_then(|_| match outcome.content_length {
                Some(len) => self.record_content_length(item_id, len),
                None => Ok(()),
            });

        match reported {
            Ok(_) => outcome.job_status,
            Err(ItemError::NotFound(_)) => {
                info!("Podcast item {} was deleted, cancelling job", item_id);
                JobStatus::Cancelled
            }
            Err(e) => {
                warn!(
                    "Failed to update podcast item status for {}: {}",
                    item_id, e
                );
                JobStatus::Failed
            }
        }
    }

    /// A size that cannot be stored leaves the status change in place.
    fn record_content_length(&self, item_id: &str, len: u64) -> Result<(), ItemError> {
        match self.sink.update_content_length(item_id, len) {
            Ok(_) => Ok(()),
            Err(e @ ItemError::NotFound(_)) => Err(e),
            Err(e) => {
                warn!("Failed to record content length of {}: {}", item_id, e);
                Ok(())
            }
        }
    }

    fn release(&self, job: Job) {
        let job = job.released();
        if let Err(e) = self.queue.update(&job) {
            error!(
                "Failed to update job status to {} (job id {}): {}",
                job.status, job.item_id, e
            );
        }
    }
}

/// Delete whatever a cancelled job left at its target path.
async fn discard_target(job: &Job) {
    match tokio::fs::remove_file(&job.target_uri).await {
        Ok(()) => debug!("Removed {} of cancelled job {}", job.target_uri, job.item_id),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", job.target_uri, e),
    }
}

/// Collect handlers that already finished.
fn reap(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(e) = result {
            error!("Job handler task failed: {}", e);
        }
    }
}
