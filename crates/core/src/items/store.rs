//! Item storage traits and errors.

use thiserror::Error;

use super::{Description, ItemStatus, PodcastItem};

/// Error type for item store operations.
#[derive(Debug, Error)]
pub enum ItemError {
    /// No item with this id. The distinguished "item was deleted" condition.
    #[error("no such item: {0}")]
    NotFound(String),

    /// A stored record could not be decoded.
    #[error("corrupt item record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for ItemError {
    fn from(e: rusqlite::Error) -> Self {
        ItemError::Database(e.to_string())
    }
}

/// Receives item lifecycle transitions from the download worker.
pub trait StatusSink: Send + Sync {
    /// Set the status of an item and return the updated item.
    fn update_status(&self, item_id: &str, status: ItemStatus) -> Result<PodcastItem, ItemError>;

    /// Record the size of the stored media file.
    fn update_content_length(
        &self,
        item_id: &str,
        content_length: u64,
    ) -> Result<PodcastItem, ItemError>;
}

/// Storage for the podcast items that make up the feed.
pub trait ItemStore: StatusSink {
    /// Insert or overwrite an item under `item.id()`.
    fn add(&self, item: &PodcastItem) -> Result<(), ItemError>;

    fn get(&self, item_id: &str) -> Result<Option<PodcastItem>, ItemError>;

    /// Replace the title and description of an item.
    fn update_description(
        &self,
        item_id: &str,
        description: &Description,
    ) -> Result<PodcastItem, ItemError>;

    /// Delete an item and return it.
    fn remove(&self, item_id: &str) -> Result<PodcastItem, ItemError>;

    /// All items, newest first.
    fn list(&self) -> Result<Vec<PodcastItem>, ItemError>;
}
