//! HTTP fetcher implementation.

use async_trait::async_trait;
use reqwest::{Client, Proxy};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::files::TempPath;

use super::config::FetcherConfig;
use super::traits::{FetchError, FetchedFile, FileFetcher};

/// Downloads source URIs over HTTP(S) into a temporary directory.
pub struct HttpFetcher {
    client: Client,
    temp_dir: PathBuf,
}

impl HttpFetcher {
    /// Creates a fetcher writing temporary files under `temp_dir`.
    pub fn new(config: &FetcherConfig, temp_dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone());

        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy).map_err(|e| FetchError::request("<proxy>", e))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::request("<client>", e))?;

        Ok(Self {
            client,
            temp_dir: temp_dir.into(),
        })
    }

    fn temp_path(&self) -> PathBuf {
        self.temp_dir
            .join(format!("youcast-{}", uuid::Uuid::new_v4().simple()))
    }

    async fn write_body(
        url: &str,
        mut response: reqwest::Response,
        path: &Path,
    ) -> Result<u64, FetchError> {
        let mut writer = BufWriter::new(File::create(path).await?);
        let mut written = 0u64;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::request(url, e))?
        {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl FileFetcher for HttpFetcher {
    async fn fetch(&self, source_uri: &str) -> Result<FetchedFile, FetchError> {
        let response = self
            .client
            .get(source_uri)
            .send()
            .await
            .map_err(|e| FetchError::request(source_uri, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status {
                url: source_uri.to_string(),
                status: status.as_u16(),
            });
        }

        fs::create_dir_all(&self.temp_dir).await?;
        // Removed on error or if this future is dropped mid-body
        let temp = TempPath::new(self.temp_path());
        debug!("Fetching {} into {:?}", source_uri, temp.path());

        let bytes_written = Self::write_body(source_uri, response, temp.path()).await?;
        Ok(FetchedFile {
            path: temp.keep(),
            bytes_written,
        })
    }
}
