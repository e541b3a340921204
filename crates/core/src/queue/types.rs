//! Download job types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of a download job.
///
/// Only `Added`, `Downloaded` and `Failed` are ever stored. Updating a job to
/// `Ready` or `Cancelled` removes it from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for the source file to be fetched.
    Added,
    /// Fetched to the target location, waiting for transcoding.
    Downloaded,
    /// Transcoded and playable.
    Ready,
    /// A fetch or transcode step failed.
    Failed,
    /// The owning item disappeared while the job was in flight.
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Added => "added",
            JobStatus::Downloaded => "downloaded",
            JobStatus::Ready => "ready",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Whether updating a job to this status deletes it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Added => 0,
            JobStatus::Downloaded => 1,
            JobStatus::Failed => 2,
            JobStatus::Ready | JobStatus::Cancelled => 3,
        }
    }

    /// Whether a stored job in this status may be rewritten with `next`.
    ///
    /// Terminal statuses are always reachable. Otherwise the status may stay
    /// the same or move forward, never back.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        next.is_terminal() || next.rank() >= self.rank()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of pending work for one podcast item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Identifier of the owning podcast item. Unique across the queue.
    pub item_id: String,
    pub status: JobStatus,
    /// Locator the fetcher reads from.
    pub source_uri: String,
    /// Local path the fetcher writes to and the transcoder rewrites in place.
    pub target_uri: String,
    /// Claim flag held by the worker currently processing the job.
    #[serde(default)]
    pub active: bool,
}

impl Job {
    /// Create a freshly admitted, unclaimed job.
    pub fn new(
        item_id: impl Into<String>,
        source_uri: impl Into<String>,
        target_uri: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            status: JobStatus::Added,
            source_uri: source_uri.into(),
            target_uri: target_uri.into(),
            active: false,
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    /// The same job with its claim dropped.
    pub fn released(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Stored form of a job. The item id is the row key and is not repeated.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct JobRecord {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_uri: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub active: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl JobRecord {
    pub fn from_job(job: &Job) -> Self {
        Self {
            status: job.status,
            source_uri: job.source_uri.clone(),
            target_uri: job.target_uri.clone(),
            active: job.active,
        }
    }

    pub fn into_job(self, item_id: String) -> Job {
        Job {
            item_id,
            status: self.status,
            source_uri: self.source_uri,
            target_uri: self.target_uri,
            active: self.active,
        }
    }
}
