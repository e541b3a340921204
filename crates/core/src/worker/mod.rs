//! Download worker driving jobs through the pipeline.
//!
//! Jobs move through these states:
//! - **Added**: fetched from the source URI and moved to the target path
//! - **Downloaded**: transcoded in place, then removed from the queue
//! - **Failed**: parked until an operator re-enqueues the job

mod config;
mod runner;
mod ticker;
mod types;

pub use config::WorkerConfig;
pub use runner::DownloadWorker;
pub use ticker::{IntervalTicker, Ticker};
pub use types::{Stage, WorkerError};
