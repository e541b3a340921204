//! Types for the download worker.

use std::fmt;

use thiserror::Error;

use crate::fetcher::FetchError;
use crate::files::FileError;
use crate::items::ItemStatus;
use crate::queue::{JobStatus, QueueError};
use crate::transcoder::TranscodeError;

/// Handler stage, used in logs, metrics and timeout errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Conversion,
    Failure,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Download => "download",
            Stage::Conversion => "conversion",
            Stage::Failure => "failure",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while handling a job.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("moving download into place failed: {0}")]
    Move(#[from] FileError),

    #[error("transcode failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: Stage, secs: u64 },

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("failed to reset job {item_id}: {source}")]
    Reset {
        item_id: String,
        #[source]
        source: QueueError,
    },
}

/// Outcome of a stage, before the status sink is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StageOutcome {
    pub job_status: JobStatus,
    pub item_status: ItemStatus,
    /// Size of the media file the stage left behind.
    pub content_length: Option<u64>,
}

impl StageOutcome {
    pub fn new(job_status: JobStatus, item_status: ItemStatus) -> Self {
        Self {
            job_status,
            item_status,
            content_length: None,
        }
    }

    pub fn with_content_length(mut self, content_length: u64) -> Self {
        self.content_length = Some(content_length);
        self
    }

    pub fn failed() -> Self {
        Self::new(JobStatus::Failed, ItemStatus::DownloadFailed)
    }
}
