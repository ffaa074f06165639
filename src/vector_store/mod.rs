//! Vector store abstraction for vidmind.
//!
//! Provides a trait-based interface for different vector database backends. Every
//! backend ranks by cosine distance (`1 - cosine similarity`).

mod chroma;
mod memory;
mod sqlite;

pub use chroma::ChromaVectorStore;
pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::Settings;
use crate::error::{Result, VidmindError};
use crate::storage::RecordMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An entry stored in the vector database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreEntry {
    /// Video identifier.
    pub id: String,
    /// Fused embedding.
    pub embedding: Vec<f32>,
    /// Retrievable document text (the transcript).
    pub document: String,
    pub metadata: RecordMetadata,
}

/// A single nearest-neighbor hit.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    pub document: String,
    pub metadata: RecordMetadata,
    /// Cosine distance (lower is closer).
    pub distance: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Add an entry. An existing entry with the same ID is replaced.
    async fn add(&self, entry: &VectorStoreEntry) -> Result<()>;

    /// Return up to `n_results` entries ordered by increasing cosine distance.
    async fn query(&self, query_embedding: &[f32], n_results: usize) -> Result<Vec<QueryMatch>>;

    /// Get total entry count.
    async fn count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance as reported by cosine-space indexes.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Rank entries by cosine distance and keep the closest `n_results`.
pub(crate) fn rank_entries<'a>(
    entries: impl Iterator<Item = &'a VectorStoreEntry>,
    query_embedding: &[f32],
    n_results: usize,
) -> Vec<QueryMatch> {
    let mut matches: Vec<QueryMatch> = entries
        .map(|entry| QueryMatch {
            id: entry.id.clone(),
            document: entry.document.clone(),
            metadata: entry.metadata.clone(),
            distance: cosine_distance(query_embedding, &entry.embedding),
        })
        .collect();

    matches.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(n_results);
    matches
}

/// Open the store selected by `vector_store.provider`.
pub async fn open_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
        "sqlite" => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        "chroma" => Arc::new(
            ChromaVectorStore::connect(
                &settings.vector_store.chroma_url,
                &settings.vector_store.collection,
            )
            .await?,
        ),
        "memory" => Arc::new(MemoryVectorStore::new()),
        other => {
            return Err(VidmindError::Config(format!(
                "Unknown vector store provider: {}",
                other
            )))
        }
    };
    Ok(store)
}
