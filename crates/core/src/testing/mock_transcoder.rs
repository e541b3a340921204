//! Mock transcoder for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::transcoder::{MediaTranscoder, TranscodeError};

/// Mock implementation of the MediaTranscoder trait.
///
/// Leaves files untouched and reports their current size.
#[derive(Debug, Default)]
pub struct MockTranscoder {
    /// Paths in the order they were transcoded.
    transcoded: Arc<Mutex<Vec<PathBuf>>>,
    /// If set, the next transcode fails with this reason.
    next_error: Arc<Mutex<Option<String>>>,
    /// When set, transcodes never complete.
    hang: Arc<AtomicBool>,
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all transcoded paths.
    pub fn transcoded(&self) -> Vec<PathBuf> {
        self.transcoded.lock().unwrap().clone()
    }

    /// Make the next transcode fail.
    pub fn set_next_error(&self, reason: &str) {
        *self.next_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn set_hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaTranscoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(&self, path: &Path) -> Result<u64, TranscodeError> {
        self.transcoded.lock().unwrap().push(path.to_path_buf());

        if self.hang.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }

        if let Some(reason) = self.next_error.lock().unwrap().take() {
            return Err(TranscodeError::failed(reason, None));
        }

        Ok(std::fs::metadata(path).map(|m| m.len()).unwrap_or(0))
    }
}
