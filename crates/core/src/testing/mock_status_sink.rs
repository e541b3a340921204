//! Mock status sink for testing.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::items::{ItemError, ItemStatus, PodcastItem, StatusSink};

/// Mock implementation of the StatusSink trait.
///
/// Tracks item statuses in memory. Updates for ids that were never
/// inserted, or were removed, fail with `ItemError::NotFound`.
#[derive(Debug, Default)]
pub struct MockStatusSink {
    items: Arc<Mutex<HashMap<String, ItemStatus>>>,
    /// Successful updates in the order they were applied.
    history: Arc<Mutex<Vec<(String, ItemStatus)>>>,
    content_lengths: Arc<Mutex<HashMap<String, u64>>>,
    /// If set, the next update fails with a database error.
    next_error: Arc<Mutex<Option<String>>>,
}

impl MockStatusSink {
    /// Create a new mock sink.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, item_id: &str, status: ItemStatus) {
        self.items
            .lock()
            .unwrap()
            .insert(item_id.to_string(), status);
    }

    /// Simulate the user deleting the item.
    pub fn remove(&self, item_id: &str) {
        self.items.lock().unwrap().remove(item_id);
    }

    pub fn status(&self, item_id: &str) -> Option<ItemStatus> {
        self.items.lock().unwrap().get(item_id).copied()
    }

    pub fn content_length(&self, item_id: &str) -> Option<u64> {
        self.content_lengths.lock().unwrap().get(item_id).copied()
    }

    pub fn history(&self) -> Vec<(String, ItemStatus)> {
        self.history.lock().unwrap().clone()
    }

    /// Make the next update fail with something other than NotFound.
    pub fn set_next_error(&self, reason: &str) {
        *self.next_error.lock().unwrap() = Some(reason.to_string());
    }
}

impl StatusSink for MockStatusSink {
    fn update_status(&self, item_id: &str, status: ItemStatus) -> Result<PodcastItem, ItemError> {
        if let Some(reason) = self.next_error.lock().unwrap().take() {
            return Err(ItemError::Database(reason));
        }

        let mut items = self.items.lock().unwrap();
        let current = items
            .get_mut(item_id)
            .ok_or_else(|| ItemError::NotFound(item_id.to_string()))?;
        *current = status;

        self.history
            .lock()
            .unwrap()
            .push((item_id.to_string(), status));

        let mut item = PodcastItem::new(item_id, Utc::now());
        item.status = status;
        Ok(item)
    }

    fn update_content_length(
        &self,
        item_id: &str,
        content_length: u64,
    ) -> Result<PodcastItem, ItemError> {
        if let Some(reason) = self.next_error.lock().unwrap().take() {
            return Err(ItemError::Database(reason));
        }

        let status = self
            .status(item_id)
            .ok_or_else(|| ItemError::NotFound(item_id.to_string()))?;
        self.content_lengths
            .lock()
            .unwrap()
            .insert(item_id.to_string(), content_length);

        let mut item = PodcastItem::new(item_id, Utc::now());
        item.status = status;
        item.content_length = content_length;
        Ok(item)
    }
}
