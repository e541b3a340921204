//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching a source file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("Failed to fetch {url}: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with an error status.
    #[error("Failed to fetch {url}: server responded with {status}")]
    Status { url: String, status: u16 },

    /// I/O error writing the local copy.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn request(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Request {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// A source file copied to local temporary storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Temporary file holding the content. The caller owns it.
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Retrieves the content behind a source URI into a local temporary file.
///
/// Dropping the returned future aborts the transfer.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, source_uri: &str) -> Result<FetchedFile, FetchError>;
}
