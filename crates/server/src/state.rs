use std::sync::Arc;
use youcast_core::{Config, FeedService, ItemStore, JobQueue, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    feed: FeedService,
    queue: Arc<dyn JobQueue>,
    items: Arc<dyn ItemStore>,
}

impl AppState {
    pub fn new(config: Config, items: Arc<dyn ItemStore>, queue: Arc<dyn JobQueue>) -> Self {
        let feed = FeedService::new(
            Arc::clone(&items),
            Arc::clone(&queue),
            config.storage.media_dir.clone(),
        );

        Self {
            config,
            feed,
            queue,
            items,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn feed(&self) -> &FeedService {
        &self.feed
    }

    pub fn queue(&self) -> &dyn JobQueue {
        self.queue.as_ref()
    }

    pub fn items(&self) -> &dyn ItemStore {
        self.items.as_ref()
    }
}
