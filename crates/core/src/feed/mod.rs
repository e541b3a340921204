//! Admission of podcast items into the feed and the download queue.

mod service;
mod types;

pub use service::{media_file_name, FeedService};
pub use types::FeedError;
