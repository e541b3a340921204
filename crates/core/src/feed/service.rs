//! Feed service: admits items into the feed and the download queue.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::items::{Description, ItemError, ItemStatus, ItemStore, PodcastItem};
use crate::metrics;
use crate::queue::{Job, JobQueue};

use super::types::FeedError;

/// Extensions registered for common podcast media types, preferred over
/// the generic MIME table.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[("audio/mpeg", "mp3"), ("audio/mp4", "m4a")];

/// Admits and removes podcast items together with their download jobs.
pub struct FeedService {
    items: Arc<dyn ItemStore>,
    queue: Arc<dyn JobQueue>,
    media_dir: PathBuf,
}

impl FeedService {
    pub fn new(
        items: Arc<dyn ItemStore>,
        queue: Arc<dyn JobQueue>,
        media_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            items,
            queue,
            media_dir: media_dir.into(),
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Store `item` with status `Added` and enqueue the download of
    /// `media_url` into the media directory.
    pub fn add_item(&self, mut item: PodcastItem, media_url: &str) -> Result<PodcastItem, FeedError> {
        validate_media_url(media_url)?;

        let file_name = media_file_name(media_url, &item.mime_type);
        let target = self.media_dir.join(&file_name);
        item.file_name = file_name;
        item.status = ItemStatus::Added;

        let item_id = item.id();
        self.items.add(&item)?;

        let job = Job::new(&item_id, media_url, target.to_string_lossy());
        if let Err(e) = self.queue.add(&job) {
            warn!("Failed to enqueue {}, removing item {}: {}", media_url, item_id, e);
            if let Err(re) = self.items.remove(&item_id) {
                warn!("Failed to remove item {} without a job: {}", item_id, re);
            }
            return Err(e.into());
        }

        metrics::JOBS_ENQUEUED.inc();
        info!("Added {} to the feed as {}", media_url, item_id);
        Ok(item)
    }

    /// Change the title and/or description of an item. Fields left as
    /// `None` keep their stored value.
    pub fn update_item(
        &self,
        item_id: &str,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<PodcastItem, FeedError> {
        info!("Updating {}", item_id);

        let current = self
            .items
            .get(item_id)?
            .ok_or_else(|| ItemError::NotFound(item_id.to_string()))?;
        let description = Description {
            title: title.unwrap_or(current.title),
            body: body.unwrap_or(current.description),
        };

        Ok(self.items.update_description(item_id, &description)?)
    }

    /// Remove an item, its pending job, and its media file.
    ///
    /// A missing media file is not an error. Fails with
    /// `ItemError::NotFound` when the item does not exist.
    pub async fn remove_item(&self, item_id: &str) -> Result<PodcastItem, FeedError> {
        info!("Removing {}", item_id);

        let item = self.items.remove(item_id)?;
        if self.queue.remove(item_id)? {
            info!("Removed pending job for {}", item_id);
        }

        if !item.file_name.is_empty() {
            let path = self.media_dir.join(&item.file_name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(FeedError::Io { path, source }),
            }
        }

        Ok(item)
    }

    /// All feed items, newest first.
    pub fn items(&self) -> Result<Vec<PodcastItem>, FeedError> {
        Ok(self.items.list()?)
    }
}

fn validate_media_url(media_url: &str) -> Result<(), FeedError> {
    let invalid = |reason: String| FeedError::InvalidMediaUrl {
        url: media_url.to_string(),
        reason,
    };

    if media_url.trim().is_empty() {
        return Err(invalid("empty".to_string()));
    }
    reqwest::Url::parse(media_url).map_err(|e| invalid(e.to_string()))?;
    Ok(())
}

/// Storage file name for a media URL: the hex SHA-256 of the URL plus an
/// extension derived from the MIME type, when one is known.
pub fn media_file_name(media_url: &str, mime_type: &str) -> String {
    let digest = Sha256::digest(media_url.as_bytes());
    let mut name: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

    match extension_for(mime_type) {
        Some(ext) => {
            name.push('.');
            name.push_str(ext);
        }
        None if !mime_type.is_empty() => {
            warn!("No file extension registered for {}", mime_type);
        }
        None => {}
    }
    name
}

fn extension_for(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    if essence.is_empty() {
        return None;
    }

    PREFERRED_EXTENSIONS
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(essence).and_then(|exts| exts.first().copied())
        })
}
