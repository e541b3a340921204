//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TranscodeError;

/// Normalizes a downloaded media file in place.
///
/// Dropping the returned future stops the transcoding process.
#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Rewrites the file at `path` and returns its new size in bytes.
    async fn transcode(&self, path: &Path) -> Result<u64, TranscodeError>;

    /// Validates that the transcoder is properly configured and ready.
    async fn validate(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
