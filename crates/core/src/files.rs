//! Local file helpers shared by the fetch and feed steps.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{self, AsyncWriteExt, BufReader, BufWriter};

/// Errors from moving a file into place.
#[derive(Debug, Error)]
pub enum FileError {
    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Failed to create destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to delete the source after copying.
    #[error("Failed to remove {path}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    fn copy_failed(source: &Path, destination: &Path, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            error,
        }
    }
}

/// Move `source` to `destination`, which may be on a different filesystem.
///
/// A rename is attempted first. When the paths are on different devices the
/// file is copied and the source deleted. Missing parent directories of the
/// destination are created. An existing destination is overwritten.
pub async fn move_file(source: &Path, destination: &Path) -> Result<(), FileError> {
    if fs::metadata(source).await.is_err() {
        return Err(FileError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| FileError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    match fs::rename(source, destination).await {
        Ok(()) => return Ok(()),
        // Cross-filesystem renames fail with EXDEV (18 on Linux)
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) => {}
        Err(e) => return Err(FileError::copy_failed(source, destination, e)),
    }

    copy_file(source, destination).await?;

    fs::remove_file(source)
        .await
        .map_err(|e| FileError::CleanupFailed {
            path: source.to_path_buf(),
            source: e,
        })
}

async fn copy_file(source: &Path, destination: &Path) -> Result<u64, FileError> {
    let source_file = File::open(source)
        .await
        .map_err(|e| FileError::copy_failed(source, destination, e))?;
    let dest_file = File::create(destination)
        .await
        .map_err(|e| FileError::copy_failed(source, destination, e))?;

    let mut reader = BufReader::new(source_file);
    let mut writer = BufWriter::new(dest_file);

    let copied = io::copy(&mut reader, &mut writer)
        .await
        .map_err(|e| FileError::copy_failed(source, destination, e))?;
    writer
        .flush()
        .await
        .map_err(|e| FileError::copy_failed(source, destination, e))?;

    Ok(copied)
}

/// Removes a temporary file when dropped, including when the owning future
/// is cancelled.
#[derive(Debug)]
pub struct TempPath {
    path: Option<PathBuf>,
}

impl TempPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Keep the file on disk and hand back its path.
    pub fn keep(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            // Already moved into place in the common case
            let _ = std::fs::remove_file(path);
        }
    }
}

/// A byte count rendered with binary units, e.g. `1.50 MB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSize(pub u64);

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const KB: u64 = 1 << 10;
        const MB: u64 = 1 << 20;
        const GB: u64 = 1 << 30;
        const TB: u64 = 1 << 40;

        let bytes = self.0;
        match bytes {
            b if b >= TB => write!(f, "{:.2} TB", b as f64 / TB as f64),
            b if b >= GB => write!(f, "{:.2} GB", b as f64 / GB as f64),
            b if b >= MB => write!(f, "{:.2} MB", b as f64 / MB as f64),
            b if b >= KB => write!(f, "{} kB", b / KB),
            1 => write!(f, "1 byte"),
            b => write!(f, "{} bytes", b),
        }
    }
}
