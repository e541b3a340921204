//! In-place media normalization of downloaded files.

mod config;
mod error;
mod ffmpeg;
mod traits;

pub use config::TranscoderConfig;
pub use error::TranscodeError;
pub use ffmpeg::FfmpegTranscoder;
pub use traits::MediaTranscoder;
