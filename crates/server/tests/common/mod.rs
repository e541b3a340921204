//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the router in-process on
//! a temporary database, with an optional download worker driven by mocked
//! fetch and transcode steps and a manual ticker.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use youcast_core::{
    config::{DatabaseConfig, ServerConfig, StorageConfig},
    testing::{ManualTicker, MockFetcher, MockTranscoder, TickHandle},
    Config, DownloadWorker, SqliteItemStore, SqliteJobQueue,
};
use youcast_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use youcast_core::testing::fixtures;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_item_creation() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/items", json!({
///         "title": "Episode 1",
///         "media_url": "https://media.example.com/1.mp3"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub config: Config,
    pub items: Arc<SqliteItemStore>,
    pub queue: Arc<SqliteJobQueue>,
    /// Mock fetcher - configure download responses
    pub fetcher: Arc<MockFetcher>,
    /// Mock transcoder - control conversions
    pub transcoder: Arc<MockTranscoder>,
    /// Temporary directory for the test database and media
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Undecoded response from a test request
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// A download worker running against the fixture's stores.
pub struct TestWorker {
    pub ticks: TickHandle,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TestWorker {
    pub async fn stop(self) {
        self.cancel.cancel();
        self.handle.await.expect("worker task panicked");
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("feed.db");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 8080, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            storage: StorageConfig {
                media_dir: temp_dir.path().join("media"),
                temp_dir: temp_dir.path().join("tmp"),
            },
            ..Config::default()
        };

        let items = Arc::new(SqliteItemStore::new(&db_path).expect("Failed to create item store"));
        let queue = Arc::new(SqliteJobQueue::new(&db_path).expect("Failed to create job queue"));
        let fetcher = Arc::new(MockFetcher::new(&config.storage.temp_dir));
        let transcoder = Arc::new(MockTranscoder::new());

        let state = Arc::new(AppState::new(config.clone(), items.clone(), queue.clone()));
        let router = create_router(state);

        Self {
            router,
            config,
            items,
            queue,
            fetcher,
            transcoder,
            temp_dir,
        }
    }

    /// Start a download worker driven by a manual ticker.
    pub fn start_worker(&self) -> TestWorker {
        let worker = DownloadWorker::new(
            &self.config.worker,
            self.queue.clone(),
            self.items.clone(),
            self.fetcher.clone(),
            self.transcoder.clone(),
        );
        let (ticker, ticks) = ManualTicker::new();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { worker.run_with_ticker(token, ticker).await });

        TestWorker {
            ticks,
            cancel,
            handle,
        }
    }

    pub fn media_path(&self, file_name: &str) -> PathBuf {
        self.config.storage.media_dir.join(file_name)
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PATCH request with JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.request("PATCH", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let response = self.get_raw(path).await;
        (
            response.status,
            String::from_utf8_lossy(&response.body).into_owned(),
        )
    }

    /// Send a GET request and return the body bytes with the content type.
    pub async fn get_raw(&self, path: &str) -> RawResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        RawResponse {
            status,
            content_type,
            body,
        }
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
