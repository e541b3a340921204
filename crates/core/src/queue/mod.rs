//! Durable download job queue.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteJobQueue;
pub use store::{JobQueue, QueueError};
pub use types::{Job, JobStatus};
