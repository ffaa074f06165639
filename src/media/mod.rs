//! Media acquisition and visual sampling.
//!
//! Video download goes through yt-dlp; audio extraction, frame-rate probing and frame
//! sampling go through ffmpeg/ffprobe. Both sit behind traits so the pipeline can run
//! against other backends.

mod downloader;
mod frames;

pub use downloader::YtDlpSource;
pub use frames::{frame_file_name, frame_stride, parse_frame_rate, FfmpegFrameSampler, SamplingPlan};

use crate::error::{Result, VidmindError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

/// Reject anything that is not an absolute http(s) URL before handing it to yt-dlp.
pub fn validate_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())
        .map_err(|e| VidmindError::InvalidInput(format!("Invalid video URL '{}': {}", input, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(VidmindError::InvalidInput(format!(
            "Unsupported URL scheme '{}' in {}",
            scheme, input
        ))),
    }
}

/// A locally downloaded video.
#[derive(Debug, Clone)]
pub struct DownloadedVideo {
    pub path: PathBuf,
    /// Title reported by the source, if any.
    pub title: Option<String>,
}

/// Fetches videos and derives their audio track.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Download the video behind `url`.
    async fn download_video(&self, url: &str, video_id: &str) -> Result<DownloadedVideo>;

    /// Extract the audio track of `video` to `output`.
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<PathBuf>;
}

/// Samples still frames from a video.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    /// Save one frame every `interval_seconds` into `output_dir`, returning the paths in
    /// decode order.
    async fn sample(
        &self,
        video: &Path,
        output_dir: &Path,
        interval_seconds: f64,
    ) -> Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url(" http://example.com/v.mp4 ").is_ok());
        assert!(matches!(validate_url("not a url"), Err(VidmindError::InvalidInput(_))));
        assert!(matches!(validate_url("file:///etc/passwd"), Err(VidmindError::InvalidInput(_))));
    }
}
