//! On-disk layout and JSON embedding records.
//!
//! Every ingested video owns `videos/<id>/` under the data directory, where `<id>` is the
//! md5 of its source URL. Re-ingesting a URL therefore overwrites the same files.

use crate::error::{Result, VidmindError};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Placeholder title used when the downloader cannot supply one.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Derive the stable video identifier for a source URL.
pub fn video_id(url: &str) -> String {
    hex::encode(Md5::digest(url.as_bytes()))
}

/// Check that `id` has the shape [`video_id`] produces: 32 lowercase hex characters.
///
/// IDs from the command line are joined into paths, so anything else is rejected.
pub fn check_video_id(id: &str) -> Result<&str> {
    let well_formed =
        id.len() == 32 && id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
        Ok(id)
    } else {
        Err(VidmindError::InvalidInput(format!(
            "'{}' is not a video ID (expected 32 lowercase hex characters)",
            id
        )))
    }
}

/// Paths for everything vidmind writes.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("videos")
    }

    pub fn video_dir(&self, id: &str) -> PathBuf {
        self.videos_dir().join(id)
    }

    pub fn frames_dir(&self, id: &str) -> PathBuf {
        self.video_dir(id).join("frames")
    }

    pub fn audio_path(&self, id: &str) -> PathBuf {
        self.video_dir(id).join("audio.mp3")
    }

    pub fn embedding_path(&self, id: &str) -> PathBuf {
        self.video_dir(id).join("embedding.json")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    pub fn pdfs_dir(&self) -> PathBuf {
        self.root.join("pdfs")
    }
}

/// Metadata stored with every record and vector-store entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub url: String,
    /// Full transcript text.
    pub text: String,
    pub title: String,
    pub video_id: String,
}

/// Contents of `embedding.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub video_id: String,
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// An ingested video and where its artifacts live.
#[derive(Debug, Clone)]
pub struct VideoRecord {
    pub id: String,
    pub url: String,
    pub transcript: String,
    pub embedding: Vec<f32>,
    pub title: String,
    pub dir: PathBuf,
}

impl VideoRecord {
    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            url: self.url.clone(),
            text: self.transcript.clone(),
            title: self.title.clone(),
            video_id: self.id.clone(),
        }
    }

    pub fn to_embedding_record(&self) -> EmbeddingRecord {
        EmbeddingRecord {
            video_id: self.id.clone(),
            embedding: self.embedding.clone(),
            metadata: self.metadata(),
        }
    }

    /// Rebuild a record from its stored JSON form.
    pub fn from_embedding_record(record: EmbeddingRecord, layout: &DataLayout) -> Self {
        Self {
            dir: layout.video_dir(&record.video_id),
            id: record.video_id,
            url: record.metadata.url,
            transcript: record.metadata.text,
            embedding: record.embedding,
            title: record.metadata.title,
        }
    }
}

/// Write `embedding.json` for a record, replacing any previous version.
pub fn save_embedding_record(layout: &DataLayout, record: &VideoRecord) -> Result<PathBuf> {
    let dir = layout.video_dir(&record.id);
    std::fs::create_dir_all(&dir)?;

    let path = layout.embedding_path(&record.id);
    let json = serde_json::to_string_pretty(&record.to_embedding_record())?;
    std::fs::write(&path, json)?;

    info!("Embedding saved to {}", path.display());
    Ok(path)
}

/// Load the stored record for a video ID.
pub fn load_embedding_record(layout: &DataLayout, id: &str) -> Result<EmbeddingRecord> {
    let path = layout.embedding_path(check_video_id(id)?);
    if !path.exists() {
        return Err(VidmindError::InvalidInput(format!(
            "No stored record for video '{}'",
            id
        )));
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

/// List every stored record, sorted by title.
///
/// Directories without a readable `embedding.json` are skipped.
pub fn list_records(layout: &DataLayout) -> Result<Vec<EmbeddingRecord>> {
    let videos_dir = layout.videos_dir();
    if !videos_dir.exists() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for entry in std::fs::read_dir(&videos_dir)?.flatten() {
        let path = entry.path().join("embedding.json");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path)
            .map_err(VidmindError::from)
            .and_then(|c| serde_json::from_str::<EmbeddingRecord>(&c).map_err(VidmindError::from))
        {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
        }
    }

    records.sort_by(|a, b| a.metadata.title.cmp(&b.metadata.title));
    debug!("Found {} stored records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(layout: &DataLayout, url: &str, text: &str) -> VideoRecord {
        let id = video_id(url);
        VideoRecord {
            dir: layout.video_dir(&id),
            id,
            url: url.to_string(),
            transcript: text.to_string(),
            embedding: vec![0.5, 0.5],
            title: UNKNOWN_TITLE.to_string(),
        }
    }

    #[test]
    fn test_video_id_is_md5_hex() {
        // md5("") is a well-known constant
        assert_eq!(video_id(""), "d41d8cd98f00b204e9800998ecf8427e");
        let id = video_id("https://x/watch?v=abc");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_video_id_is_stable_and_distinct() {
        let a = "https://youtube.com/watch?v=one";
        let b = "https://youtube.com/watch?v=two";
        assert_eq!(video_id(a), video_id(a));
        assert_ne!(video_id(a), video_id(b));
    }

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::new("data");
        assert_eq!(layout.embedding_path("abc"), PathBuf::from("data/videos/abc/embedding.json"));
        assert_eq!(layout.frames_dir("abc"), PathBuf::from("data/videos/abc/frames"));
        assert_eq!(layout.pdfs_dir(), PathBuf::from("data/pdfs"));
    }

    #[test]
    fn test_save_overwrites_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());

        let first = sample_record(&layout, "https://x/watch?v=abc", "first");
        save_embedding_record(&layout, &first).unwrap();
        let second = sample_record(&layout, "https://x/watch?v=abc", "second");
        save_embedding_record(&layout, &second).unwrap();

        let loaded = load_embedding_record(&layout, &first.id).unwrap();
        assert_eq!(loaded.metadata.text, "second");
        assert_eq!(loaded.metadata.video_id, first.id);

        let records = list_records(&layout).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_json_shape() {
        let layout = DataLayout::new("data");
        let record = sample_record(&layout, "https://x/watch?v=abc", "hello world");
        let value = serde_json::to_value(record.to_embedding_record()).unwrap();

        assert!(value["video_id"].is_string());
        assert!(value["embedding"].is_array());
        assert_eq!(value["metadata"]["text"], "hello world");
        assert_eq!(value["metadata"]["url"], "https://x/watch?v=abc");
    }

    #[test]
    fn test_missing_record_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        assert!(matches!(
            load_embedding_record(&layout, &video_id("https://x/watch?v=none")),
            Err(VidmindError::InvalidInput(_))
        ));
        assert!(list_records(&layout).unwrap().is_empty());
    }

    #[test]
    fn test_ids_outside_layout_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path().join("data"));

        // A record planted outside videos/ must stay unreachable
        let outside = dir.path().join("data").join("x");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("embedding.json"), "{}").unwrap();

        for id in ["../x", "../../etc", "ABCDEF0123456789ABCDEF0123456789", "abc", ""] {
            assert!(
                matches!(load_embedding_record(&layout, id), Err(VidmindError::InvalidInput(_))),
                "accepted {:?}",
                id
            );
        }
        assert!(check_video_id(&video_id("https://x/watch?v=abc")).is_ok());
    }
}
