//! Podcast items and their user-visible status.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteItemStore;
pub use store::{ItemError, ItemStore, StatusSink};
pub use types::{Description, ItemStatus, PodcastItem};
