//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the worker's collaborator
//! traits, allowing pipeline tests without network access or ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use youcast_core::testing::{ManualTicker, MockFetcher, MockStatusSink, MockTranscoder};
//!
//! let fetcher = MockFetcher::new(temp_dir.path());
//! let sink = MockStatusSink::new();
//! let (ticker, ticks) = ManualTicker::new();
//!
//! // Configure mock responses
//! fetcher.set_body("http://x/a.mp3", b"fake mp3");
//! sink.insert("a", ItemStatus::Added);
//!
//! // Run the worker on `ticker`, then drive it
//! ticks.tick().await;
//! ```

mod manual_ticker;
mod mock_fetcher;
mod mock_status_sink;
mod mock_transcoder;

pub use manual_ticker::{ManualTicker, TickHandle};
pub use mock_fetcher::{MockFetcher, MockResponse};
pub use mock_status_sink::MockStatusSink;
pub use mock_transcoder::MockTranscoder;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::Duration;

    use crate::items::PodcastItem;

    /// A fixed timestamp, offset by `seconds`, for stable item ids.
    pub fn added_at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
            + chrono::Duration::seconds(seconds)
    }

    /// Create a test podcast item with reasonable defaults.
    pub fn podcast_item(title: &str, seconds: i64) -> PodcastItem {
        let mut item = PodcastItem::new(title, added_at(seconds));
        item.author = "Test Author".to_string();
        item.description = format!("An episode called {}.", title);
        item.original_url = format!("https://example.com/watch/{}", seconds);
        item.mime_type = "audio/mpeg".to_string();
        item
    }

    /// Poll `condition` until it holds or `timeout` elapses.
    pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }
}
