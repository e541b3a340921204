//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::MediaTranscoder;
use crate::files::TempPath;

/// Strips video streams and copies audio without re-encoding.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Builds ffmpeg arguments for the audio-copy pass.
    fn build_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.config.log_level.clone(),
            "-y".to_string(),
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            "-vn".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> TranscodeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscodeError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            TranscodeError::Io(e)
        }
    }

    async fn run(&self, input_path: &Path, output_path: &Path) -> Result<u64, TranscodeError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .args(self.build_args(input_path, output_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("ffmpeg responded with: {}", stderr);
            return Err(TranscodeError::failed(
                format!("ffmpeg exited with {}", output.status),
                (!stderr.is_empty()).then_some(stderr),
            ));
        }

        let size = fs::metadata(output_path).await?.len();
        fs::rename(output_path, input_path).await?;
        Ok(size)
    }
}

/// Sibling path used as ffmpeg output, `<stem>.tmp.<ext>`.
pub(crate) fn temp_output_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match input_path.extension() {
        Some(ext) => format!("{}.tmp.{}", stem, ext.to_string_lossy()),
        None => format!("{}.tmp", stem),
    };
    input_path.with_file_name(name)
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn transcode(&self, path: &Path) -> Result<u64, TranscodeError> {
        if !path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        // Cleared on every exit, including the future being dropped mid-run
        let temp = TempPath::new(temp_output_path(path));
        let start = Instant::now();
        debug!("Transcoding {:?} via {:?}", path, temp.path());

        let size = self.run(path, temp.path()).await?;
        debug!(
            "Transcoded {:?} to {} bytes in {}ms",
            path,
            size,
            start.elapsed().as_millis()
        );
        Ok(size)
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;
        Ok(())
    }
}
