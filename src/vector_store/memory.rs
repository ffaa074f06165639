//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{rank_entries, QueryMatch, VectorStore, VectorStoreEntry};
use crate::error::{Result, VidmindError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    entries: RwLock<HashMap<String, VectorStoreEntry>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> VidmindError {
    VidmindError::VectorStore(format!("Lock poisoned: {}", e))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add(&self, entry: &VectorStoreEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn query(&self, query_embedding: &[f32], n_results: usize) -> Result<Vec<QueryMatch>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(rank_entries(entries.values(), query_embedding, n_results))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::tests::entry;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store.add(&entry("video1", vec![1.0, 0.0, 0.0])).await.unwrap();
        store.add(&entry("video2", vec![0.0, 1.0, 0.0])).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        let results = store.query(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "video1");
        assert!(results[0].distance < results[1].distance);
    }

    #[tokio::test]
    async fn test_same_id_replaces_entry() {
        let store = MemoryVectorStore::new();
        store.add(&entry("video1", vec![1.0, 0.0])).await.unwrap();
        store.add(&entry("video1", vec![0.0, 1.0])).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let results = store.query(&[0.0, 1.0], 1).await.unwrap();
        assert!(results[0].distance.abs() < 1e-6);
    }
}
