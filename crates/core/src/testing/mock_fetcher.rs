//! Mock file fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::fetcher::{FetchError, FetchedFile, FileFetcher};

/// How the mock answers a source URI.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Write these bytes to a fresh temp file.
    Body(Vec<u8>),
    /// Fail with a request error carrying this reason.
    Error(String),
    /// Never complete. Used to exercise timeouts and cancellation.
    Hang,
}

/// Mock implementation of the FileFetcher trait.
///
/// Unknown URIs answer with a 404 status error.
///
/// # Example
///
/// ```rust,ignore
/// use youcast_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new("/tmp/youcast-test");
/// fetcher.set_body("http://x/a.mp3", b"fake mp3");
///
/// let fetched = fetcher.fetch("http://x/a.mp3").await?;
/// assert_eq!(fetcher.fetched(), vec!["http://x/a.mp3"]);
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    temp_dir: PathBuf,
    /// Configured responses by source URI.
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Source URIs in the order they were fetched.
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Create a mock writing temp files into `temp_dir`.
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_response(&self, uri: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap()
            .insert(uri.to_string(), response);
    }

    pub fn set_body(&self, uri: &str, body: &[u8]) {
        self.set_response(uri, MockResponse::Body(body.to_vec()));
    }

    pub fn set_error(&self, uri: &str, reason: &str) {
        self.set_response(uri, MockResponse::Error(reason.to_string()));
    }

    pub fn set_hang(&self, uri: &str) {
        self.set_response(uri, MockResponse::Hang);
    }

    /// Get all fetched URIs.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileFetcher for MockFetcher {
    async fn fetch(&self, source_uri: &str) -> Result<FetchedFile, FetchError> {
        self.fetched.lock().unwrap().push(source_uri.to_string());
        let response = self.responses.lock().unwrap().get(source_uri).cloned();

        match response {
            Some(MockResponse::Body(body)) => {
                std::fs::create_dir_all(&self.temp_dir)?;
                let path = self
                    .temp_dir
                    .join(format!("youcast-mock-{}", uuid::Uuid::new_v4().simple()));
                std::fs::write(&path, &body)?;
                Ok(FetchedFile {
                    path,
                    bytes_written: body.len() as u64,
                })
            }
            Some(MockResponse::Error(reason)) => Err(FetchError::request(source_uri, reason)),
            Some(MockResponse::Hang) => std::future::pending().await,
            None => Err(FetchError::Status {
                url: source_uri.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mock_fetcher_body() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new(temp_dir.path());
        fetcher.set_body("http://x/a.mp3", b"abc");

        let fetched = fetcher.fetch("http://x/a.mp3").await.unwrap();

        assert_eq!(fetched.bytes_written, 3);
        assert_eq!(std::fs::read(&fetched.path).unwrap(), b"abc");
        assert_eq!(fetcher.fetched(), vec!["http://x/a.mp3"]);
    }

    #[tokio::test]
    async fn test_mock_fetcher_unknown_uri() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MockFetcher::new(temp_dir.path());

        let result = fetcher.fetch("http://x/missing").await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }
}
