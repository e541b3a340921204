//! Fetching source media into local temporary storage.

mod config;
mod http;
mod traits;

pub use config::FetcherConfig;
pub use http::HttpFetcher;
pub use traits::{FetchError, FetchedFile, FileFetcher};
