//! Errors for the feed service.

use std::path::PathBuf;
use thiserror::Error;

use crate::items::ItemError;
use crate::queue::QueueError;

/// Errors that can occur while admitting or removing feed items.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The media URL is empty or cannot be parsed.
    #[error("invalid media url '{url}': {reason}")]
    InvalidMediaUrl { url: String, reason: String },

    #[error("item store error: {0}")]
    Item(#[from] ItemError),

    #[error("job queue error: {0}")]
    Queue(#[from] QueueError),

    /// Failed to delete the item's media file.
    #[error("failed to delete {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FeedError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FeedError::Item(ItemError::NotFound(_)))
    }
}
