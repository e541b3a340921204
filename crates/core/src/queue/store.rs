//! Job queue trait and errors.

use thiserror::Error;

use super::{Job, JobStatus};

/// Error type for job queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Every stored job is currently claimed, or the queue is empty.
    /// Callers treat this as "nothing to do right now".
    #[error("no inactive jobs")]
    NoInactiveJobs,

    /// The update would move a stored job back to an earlier status.
    #[error("cannot move job {item_id} from {from} to {to}")]
    InvalidTransition {
        item_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    /// A stored record could not be decoded.
    #[error("corrupt job record for {item_id}: {reason}")]
    Corrupt { item_id: String, reason: String },

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl QueueError {
    pub fn is_no_inactive_jobs(&self) -> bool {
        matches!(self, QueueError::NoInactiveJobs)
    }
}

impl From<rusqlite::Error> for QueueError {
    fn from(e: rusqlite::Error) -> Self {
        QueueError::Database(e.to_string())
    }
}

/// Durable queue of download jobs keyed by item id.
pub trait JobQueue: Send + Sync {
    /// Insert or overwrite the job for `job.item_id`.
    fn add(&self, job: &Job) -> Result<(), QueueError>;

    /// Claim the first unclaimed job in key order.
    ///
    /// The scan and the claim happen in one write transaction, so a job is
    /// never handed to two callers at once.
    fn next(&self) -> Result<Job, QueueError>;

    /// Persist a job as given. `Ready` and `Cancelled` jobs are deleted.
    fn update(&self, job: &Job) -> Result<(), QueueError>;

    /// Snapshot of every stored job, claimed or not.
    fn all(&self) -> Result<Vec<Job>, QueueError>;

    /// Get a job by item id.
    fn get(&self, item_id: &str) -> Result<Option<Job>, QueueError>;

    /// Delete the job for an item. Returns whether a job existed.
    fn remove(&self, item_id: &str) -> Result<bool, QueueError>;
}
