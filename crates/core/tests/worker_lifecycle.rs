//! Download worker lifecycle integration tests.
//!
//! These tests drive the worker poll loop tick by tick against real SQLite
//! stores, with mocked fetch and transcode steps:
//! added -> downloaded -> ready (removed from the queue)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use youcast_core::{
    testing::{fixtures, ManualTicker, MockFetcher, MockTranscoder, TickHandle},
    DownloadWorker, FeedService, ItemStatus, ItemStore, Job, JobQueue, JobStatus, PodcastItem,
    SqliteItemStore, SqliteJobQueue, WorkerConfig,
};

const WAIT: Duration = Duration::from_secs(5);
const MEDIA_URL: &str = "https://media.example.com/episode-1.mp3";

/// Test helper wiring real stores to mocked collaborators.
struct TestHarness {
    items: Arc<SqliteItemStore>,
    queue: Arc<SqliteJobQueue>,
    fetcher: Arc<MockFetcher>,
    transcoder: Arc<MockTranscoder>,
    feed: FeedService,
    temp_dir: TempDir,
}

/// A worker loop running in the background.
struct RunningWorker {
    ticks: TickHandle,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningWorker {
    async fn stop(self) {
        self.cancel.cancel();
        self.handle.await.expect("worker task panicked");
    }
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("feed.db");

        let items = Arc::new(SqliteItemStore::new(&db_path).expect("Failed to create item store"));
        let queue = Arc::new(SqliteJobQueue::new(&db_path).expect("Failed to create job queue"));
        let fetcher = Arc::new(MockFetcher::new(temp_dir.path().join("tmp")));
        let transcoder = Arc::new(MockTranscoder::new());
        let feed = FeedService::new(items.clone(), queue.clone(), temp_dir.path().join("media"));

        Self {
            items,
            queue,
            fetcher,
            transcoder,
            feed,
            temp_dir,
        }
    }

    fn worker(&self) -> DownloadWorker {
        DownloadWorker::new(
            &WorkerConfig::default(),
            self.queue.clone(),
            self.items.clone(),
            self.fetcher.clone(),
            self.transcoder.clone(),
        )
    }

    fn start(&self) -> RunningWorker {
        let worker = self.worker();
        let (ticker, ticks) = ManualTicker::new();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { worker.run_with_ticker(token, ticker).await });

        RunningWorker {
            ticks,
            cancel,
            handle,
        }
    }

    fn add_episode(&self, seconds: i64) -> PodcastItem {
        self.feed
            .add_item(fixtures::podcast_item("Episode", seconds), MEDIA_URL)
            .expect("Failed to add item")
    }

    fn job(&self, item_id: &str) -> Option<Job> {
        self.queue.get(item_id).expect("Failed to read job")
    }

    fn item_status(&self, item_id: &str) -> Option<ItemStatus> {
        self.items
            .get(item_id)
            .expect("Failed to read item")
            .map(|item| item.status)
    }

    fn media_path(&self, item: &PodcastItem) -> std::path::PathBuf {
        self.temp_dir.path().join("media").join(&item.file_name)
    }

    async fn wait_for_job(&self, item_id: &str, check: impl Fn(Option<&Job>) -> bool) {
        let satisfied = fixtures::wait_until(WAIT, || check(self.job(item_id).as_ref())).await;
        assert!(satisfied, "job {} never reached the expected state: {:?}", item_id, self.job(item_id));
    }
}

fn released_with(status: JobStatus) -> impl Fn(Option<&Job>) -> bool {
    move |job| matches!(job, Some(j) if j.status == status && !j.active)
}

fn temp_file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_happy_path_ends_ready_and_removed() {
    let h = TestHarness::new();
    h.fetcher.set_body(MEDIA_URL, b"fake mp3 data");
    let item = h.add_episode(0);
    let id = item.id();
    let worker = h.start();

    // Tick 1: download
    worker.ticks.tick().await;
    h.wait_for_job(&id, released_with(JobStatus::Downloaded)).await;
    assert_eq!(h.item_status(&id), Some(ItemStatus::Downloaded));
    assert_eq!(std::fs::read(h.media_path(&item)).unwrap(), b"fake mp3 data");
    assert_eq!(temp_file_count(&h.temp_dir.path().join("tmp")), 0);

    // Tick 2: transcode, then the job is gone
    worker.ticks.tick().await;
    h.wait_for_job(&id, |job| job.is_none()).await;
    assert_eq!(h.item_status(&id), Some(ItemStatus::Ready));
    assert!(h.items.get(&id).unwrap().unwrap().playable());
    assert!(h.queue.all().unwrap().is_empty());
    assert_eq!(h.transcoder.transcoded(), vec![h.media_path(&item)]);

    worker.stop().await;
}

#[tokio::test]
async fn test_empty_queue_tick_does_nothing() {
    let h = TestHarness::new();
    let worker = h.start();

    worker.ticks.tick().await;
    worker.ticks.tick().await;

    assert!(h.fetcher.fetched().is_empty());
    assert!(h.queue.all().unwrap().is_empty());
    worker.stop().await;
}

#[tokio::test]
async fn test_deleted_item_cancels_job() {
    let h = TestHarness::new();
    h.fetcher.set_body(MEDIA_URL, b"fake mp3 data");
    let item = h.add_episode(0);
    let id = item.id();

    // The user deletes the item but its job is still queued
    h.items.remove(&id).unwrap();
    assert!(h.job(&id).is_some());

    let worker = h.start();
    worker.ticks.tick().await;

    h.wait_for_job(&id, |job| job.is_none()).await;
    assert_eq!(h.fetcher.fetched(), vec![MEDIA_URL]);
    assert!(!h.media_path(&item).exists());

    // Nothing left to do
    worker.ticks.tick().await;
    assert_eq!(h.fetcher.fetched().len(), 1);
    worker.stop().await;
}

#[tokio::test]
async fn test_failed_download_is_parked_until_retried() {
    let h = TestHarness::new();
    h.fetcher.set_error(MEDIA_URL, "connection reset by peer");
    let item = h.add_episode(0);
    let id = item.id();
    let worker = h.start();

    worker.ticks.tick().await;
    h.wait_for_job(&id, released_with(JobStatus::Failed)).await;
    assert_eq!(h.item_status(&id), Some(ItemStatus::DownloadFailed));

    // The failed job is claimed once more and then left parked
    worker.ticks.tick().await;
    h.wait_for_job(&id, |job| matches!(job, Some(j) if j.active)).await;
    worker.ticks.tick().await;
    assert_eq!(h.fetcher.fetched().len(), 1);
    assert_eq!(h.job(&id).unwrap().status, JobStatus::Failed);

    // Operator retry: re-add as a fresh job
    h.fetcher.set_body(MEDIA_URL, b"second attempt");
    let failed = h.job(&id).unwrap();
    h.queue
        .add(&Job::new(&id, failed.source_uri, failed.target_uri))
        .unwrap();

    worker.ticks.tick().await;
    h.wait_for_job(&id, released_with(JobStatus::Downloaded)).await;
    assert_eq!(h.item_status(&id), Some(ItemStatus::Downloaded));
    assert_eq!(std::fs::read(h.media_path(&item)).unwrap(), b"second attempt");

    worker.stop().await;
}

#[tokio::test]
async fn test_failed_job_for_deleted_item_is_cancelled() {
    let h = TestHarness::new();
    h.fetcher.set_error(MEDIA_URL, "boom");
    let id = h.add_episode(0).id();
    let worker = h.start();

    worker.ticks.tick().await;
    h.wait_for_job(&id, released_with(JobStatus::Failed)).await;

    h.items.remove(&id).unwrap();
    worker.ticks.tick().await;
    h.wait_for_job(&id, |job| job.is_none()).await;

    worker.stop().await;
}

#[tokio::test]
async fn test_crash_recovery_releases_stale_claims() {
    let h = TestHarness::new();
    h.fetcher.set_body(MEDIA_URL, b"fake mp3 data");
    let id = h.add_episode(0).id();

    // A previous process claimed the job and died
    let claimed = h.queue.next().unwrap();
    assert_eq!(claimed.item_id, id);
    assert!(h.queue.next().unwrap_err().is_no_inactive_jobs());

    let worker = h.start();
    worker.ticks.tick().await;

    h.wait_for_job(&id, released_with(JobStatus::Downloaded)).await;
    worker.stop().await;
}

#[tokio::test]
async fn test_cancellation_leaves_claim_for_recovery() {
    let h = TestHarness::new();
    h.fetcher.set_hang(MEDIA_URL);
    let id = h.add_episode(0).id();
    let worker = h.start();

    worker.ticks.tick().await;
    assert!(fixtures::wait_until(WAIT, || !h.fetcher.fetched().is_empty()).await);

    worker.stop().await;

    // Neither the queue nor the item saw an update
    let job = h.job(&id).unwrap();
    assert!(job.active);
    assert_eq!(job.status, JobStatus::Added);
    assert_eq!(h.item_status(&id), Some(ItemStatus::Added));

    // The next start releases the claim and the job proceeds
    h.fetcher.set_body(MEDIA_URL, b"fake mp3 data");
    let worker = h.start();
    worker.ticks.tick().await;
    h.wait_for_job(&id, released_with(JobStatus::Downloaded)).await;
    worker.stop().await;
}

#[tokio::test]
async fn test_jobs_are_claimed_one_per_tick_in_key_order() {
    let h = TestHarness::new();
    h.fetcher.set_hang(MEDIA_URL);
    let first = h.add_episode(0).id();
    let second = h.add_episode(60).id();
    let worker = h.start();

    worker.ticks.tick().await;
    assert!(h.job(&first).unwrap().active);
    assert!(!h.job(&second).unwrap().active);

    worker.ticks.tick().await;
    assert!(h.job(&second).unwrap().active);

    worker.stop().await;
}
