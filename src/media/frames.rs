//! Frame sampling with ffprobe and ffmpeg.

use super::FrameSampler;
use crate::error::{Result, VidmindError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Prefix of the temporary files ffmpeg writes before they are renamed.
const RAW_PREFIX: &str = "sample_";

/// How frames are selected from the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingPlan {
    /// Keep every `n`-th decoded frame.
    Stride(u64),
    /// Frame rate unknown: let ffmpeg pick one frame per interval of stream time.
    Timed(f64),
}

impl SamplingPlan {
    pub fn new(fps: Option<f64>, interval_seconds: f64) -> Self {
        match fps.and_then(|f| frame_stride(f, interval_seconds)) {
            Some(stride) => SamplingPlan::Stride(stride),
            None => SamplingPlan::Timed(interval_seconds),
        }
    }

    /// ffmpeg `-vf` filter for this plan.
    fn filter(&self) -> String {
        match self {
            SamplingPlan::Stride(n) => format!("select=not(mod(n\\,{}))", n),
            SamplingPlan::Timed(interval) => format!("fps=1/{}", interval),
        }
    }

    /// Index used in the final file name for the `ordinal`-th saved frame (0-based).
    fn frame_index(&self, ordinal: u64) -> u64 {
        match self {
            SamplingPlan::Stride(n) => ordinal * n,
            SamplingPlan::Timed(_) => ordinal,
        }
    }
}

/// Number of decoded frames between two saved frames.
///
/// Returns `None` when the frame rate is zero, negative or not a number, so callers never
/// divide by a zero stride.
pub fn frame_stride(fps: f64, interval_seconds: f64) -> Option<u64> {
    if !fps.is_finite() || fps <= 0.0 || !interval_seconds.is_finite() || interval_seconds <= 0.0 {
        return None;
    }
    Some(((fps * interval_seconds).round() as u64).max(1))
}

/// Parse an ffprobe rate such as `30000/1001`, `25/1` or `29.97`.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// File name for a sampled frame.
pub fn frame_file_name(index: u64) -> String {
    format!("frame_{}.jpg", index)
}

/// ffmpeg-backed frame sampler.
#[derive(Debug, Default)]
pub struct FfmpegFrameSampler;

impl FfmpegFrameSampler {
    pub fn new() -> Self {
        Self
    }

    /// Query the first video stream's frame rate.
    async fn read_frame_rate(&self, video: &Path) -> Result<Option<f64>> {
        let result = Command::new("ffprobe")
            .args(["-v", "quiet"])
            .args(["-select_streams", "v:0"])
            .args(["-show_entries", "stream=avg_frame_rate,r_frame_rate"])
            .args(["-print_format", "json"])
            .arg(video)
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidmindError::ToolNotFound("ffprobe".into()));
            }
            Err(e) => return Err(VidmindError::ToolFailed(format!("ffprobe failed: {e}"))),
        };

        if !output.status.success() {
            return Err(VidmindError::ToolFailed("ffprobe returned error".into()));
        }

        let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|_| VidmindError::ToolFailed("Invalid ffprobe output".into()))?;

        let stream = &parsed["streams"][0];
        let fps = stream["avg_frame_rate"]
            .as_str()
            .and_then(parse_frame_rate)
            .or_else(|| stream["r_frame_rate"].as_str().and_then(parse_frame_rate));

        Ok(fps)
    }
}

#[async_trait]
impl FrameSampler for FfmpegFrameSampler {
    #[instrument(skip(self), fields(video = %video.display()))]
    async fn sample(
        &self,
        video: &Path,
        output_dir: &Path,
        interval_seconds: f64,
    ) -> Result<Vec<PathBuf>> {
        if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
            return Err(VidmindError::InvalidInput(format!(
                "Frame interval must be positive, got {}",
                interval_seconds
            )));
        }

        std::fs::create_dir_all(output_dir)?;

        let fps = self.read_frame_rate(video).await?;
        let plan = SamplingPlan::new(fps, interval_seconds);
        match plan {
            SamplingPlan::Stride(n) => {
                info!("Sampling every {} frames ({:.2} fps)", n, fps.unwrap_or_default())
            }
            SamplingPlan::Timed(_) => warn!("Frame rate unavailable, sampling by stream time"),
        }

        let pattern = output_dir.join(format!("{}%06d.jpg", RAW_PREFIX));

        let result = Command::new("ffmpeg")
            .arg("-i")
            .arg(video)
            .arg("-vf")
            .arg(plan.filter())
            .args(["-vsync", "vfr"])
            .args(["-q:v", "2"])
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg(&pattern)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => {}
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                return Err(VidmindError::ToolFailed(format!(
                    "ffmpeg frame sampling failed: {err}"
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VidmindError::ToolNotFound("ffmpeg".into()));
            }
            Err(e) => return Err(VidmindError::ToolFailed(format!("ffmpeg error: {e}"))),
        }

        let frames = rename_samples(output_dir, plan)?;
        debug!("Saved {} frames", frames.len());
        Ok(frames)
    }
}

/// Rename ffmpeg's sequential `sample_NNNNNN.jpg` output to `frame_<index>.jpg`.
fn rename_samples(dir: &Path, plan: SamplingPlan) -> Result<Vec<PathBuf>> {
    let mut raw: Vec<(u64, PathBuf)> = std::fs::read_dir(dir)?
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let seq = name
                .strip_prefix(RAW_PREFIX)?
                .strip_suffix(".jpg")?
                .parse::<u64>()
                .ok()?;
            Some((seq, entry.path()))
        })
        .collect();
    raw.sort_by_key(|(seq, _)| *seq);

    let mut frames = Vec::with_capacity(raw.len());
    for (seq, path) in raw {
        // ffmpeg numbers output from 1
        let target = dir.join(frame_file_name(plan.frame_index(seq.saturating_sub(1))));
        std::fs::rename(&path, &target)?;
        frames.push(target);
    }
    Ok(frames)
}
