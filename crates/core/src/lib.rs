pub mod config;
pub mod feed;
pub mod fetcher;
pub mod files;
pub mod items;
pub mod metrics;
pub mod queue;
pub mod testing;
pub mod transcoder;
pub mod worker;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use feed::{FeedError, FeedService};
pub use fetcher::{FetchError, FetchedFile, FetcherConfig, FileFetcher, HttpFetcher};
pub use items::{
    Description, ItemError, ItemStatus, ItemStore, PodcastItem, SqliteItemStore, StatusSink,
};
pub use queue::{Job, JobQueue, JobStatus, QueueError, SqliteJobQueue};
pub use transcoder::{FfmpegTranscoder, MediaTranscoder, TranscodeError, TranscoderConfig};
pub use worker::{DownloadWorker, IntervalTicker, Ticker, WorkerConfig, WorkerError};
