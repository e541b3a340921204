//! Podcast item types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User-visible availability of a podcast item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Added,
    Downloaded,
    Ready,
    DownloadFailed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Added => "added",
            ItemStatus::Downloaded => "downloaded",
            ItemStatus::Ready => "ready",
            ItemStatus::DownloadFailed => "download_failed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-editable text of an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    pub title: String,
    pub body: String,
}

/// An episode in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastItem {
    pub title: String,
    pub author: String,
    pub description: String,
    /// Page the media was discovered on.
    pub original_url: String,
    /// Name of the media file inside the storage directory.
    pub file_name: String,
    pub mime_type: String,
    pub content_length: u64,
    /// Admission time. Also the source of the item id.
    pub added_at: DateTime<Utc>,
    pub status: ItemStatus,
}

impl PodcastItem {
    /// Create a newly admitted item.
    pub fn new(title: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            author: String::new(),
            description: String::new(),
            original_url: String::new(),
            file_name: String::new(),
            mime_type: String::new(),
            content_length: 0,
            added_at,
            status: ItemStatus::Added,
        }
    }

    /// Stable identifier derived from the admission time.
    pub fn id(&self) -> String {
        self.added_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    pub fn playable(&self) -> bool {
        self.status == ItemStatus::Ready
    }
}

/// Stored form of an item. The id is the row key.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ItemRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub content_length: u64,
    // Records written before statuses existed are complete episodes.
    #[serde(default = "legacy_status")]
    pub status: ItemStatus,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

fn legacy_status() -> ItemStatus {
    ItemStatus::Ready
}

impl ItemRecord {
    pub fn from_item(item: &PodcastItem) -> Self {
        Self {
            title: item.title.clone(),
            author: item.author.clone(),
            description: item.description.clone(),
            original_url: item.original_url.clone(),
            file_name: item.file_name.clone(),
            mime_type: item.mime_type.clone(),
            content_length: item.content_length,
            status: item.status,
        }
    }

    pub fn into_item(self, added_at: DateTime<Utc>) -> PodcastItem {
        PodcastItem {
            title: self.title,
            author: self.author,
            description: self.description,
            original_url: self.original_url,
            file_name: self.file_name,
            mime_type: self.mime_type,
            content_length: self.content_length,
            added_at,
            status: self.status,
        }
    }
}
