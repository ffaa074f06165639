//! Video download with yt-dlp and audio extraction with ffmpeg.

use super::{DownloadedVideo, MediaSource};
use crate::error::{Result, VidmindError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// yt-dlp backed media source.
pub struct YtDlpSource {
    output_dir: PathBuf,
    format: String,
}

impl YtDlpSource {
    pub fn new(output_dir: impl Into<PathBuf>, format: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            format: format.to_string(),
        }
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    /// Downloads the best pre-merged format, skipping playlists and post-processing.
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn download_video(&self, url: &str, video_id: &str) -> Result<DownloadedVideo> {
        std::fs::create_dir_all(&self.output_dir)?;

        info!("Downloading video from {}", url);

        let template = self.output_dir.join(format!("{}.%(ext)s", video_id));

        let result = Command::new("yt-dlp")
            .arg("--format")
            .arg(&self.format)
            .arg("--no-playlist")
            .arg("--output")
            .arg(template.to_str().unwrap_or_default())
            .arg("--no-simulate")
            .args(["--print", "title"])
            .args(["--print", "after_move:filepath"])
            .arg("--no-warnings")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidmindError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(VidmindError::Download(format!("yt-dlp execution failed: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidmindError::Download(format!("yt-dlp failed: {stderr}")));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (title, printed_path) = parse_print_output(&stdout);

        let path = match printed_path {
            Some(p) if p.exists() => p,
            _ => find_video_file(&self.output_dir, video_id)?,
        };

        info!("Downloaded file: {}", path.display());
        Ok(DownloadedVideo { path, title })
    }

    #[instrument(skip(self), fields(video = %video.display()))]
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<PathBuf> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let result = Command::new("ffmpeg")
            .arg("-i")
            .arg(video)
            .args(["-q:a", "0"])
            .args(["-map", "a"])
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => {
                info!("Audio saved to {}", output.display());
                Ok(output.to_path_buf())
            }
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(VidmindError::ToolFailed(format!("ffmpeg audio extraction failed: {err}")))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(VidmindError::ToolNotFound("ffmpeg".into()))
            }
            Err(e) => Err(VidmindError::ToolFailed(format!("ffmpeg error: {e}"))),
        }
    }
}

/// Split yt-dlp `--print title --print after_move:filepath` output into its two values.
fn parse_print_output(stdout: &str) -> (Option<String>, Option<PathBuf>) {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [] => (None, None),
        [only] => (None, Some(PathBuf::from(only))),
        [title, .., path] => (Some(title.to_string()), Some(PathBuf::from(path))),
    }
}

/// Locates a downloaded video by ID when yt-dlp did not report its path.
fn find_video_file(dir: &Path, video_id: &str) -> Result<PathBuf> {
    for ext in &["mp4", "webm", "mkv", "mov"] {
        let candidate = dir.join(format!("{}.{}", video_id, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| VidmindError::Download(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(video_id) && !name.ends_with(".part") {
            debug!("Found download by prefix: {}", name);
            return Ok(entry.path());
        }
    }

    Err(VidmindError::Download("Video file not found after download".into()))
}
