//! Context retrieval for question answering.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{QueryMatch, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Context used when retrieval yields nothing.
pub const NO_CONTEXT: &str = "No relevant context found.";

/// Documents selected for a question.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    /// Joined document text handed to the model.
    pub context: String,
    /// Matches that survived the scope filter.
    pub matches: Vec<QueryMatch>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Embeds questions and looks up the nearest stored videos.
pub struct Retriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
        }
    }

    /// Retrieve up to `top_k` documents, keeping only those for `scope` when set.
    ///
    /// Filtering happens after the query, so a scoped lookup may return fewer than
    /// `top_k` documents even when the video is indexed.
    #[instrument(skip(self, question))]
    pub async fn retrieve(
        &self,
        question: &str,
        scope: Option<&str>,
        top_k: usize,
    ) -> Result<RetrievedContext> {
        let query_embedding = self.embedder.embed_text(question).await?;
        let results = self.vector_store.query(&query_embedding, top_k).await?;
        debug!("Vector store returned {} matches", results.len());

        Ok(build_context(results, scope))
    }
}

/// Apply the scope filter and join the surviving documents.
pub fn build_context(results: Vec<QueryMatch>, scope: Option<&str>) -> RetrievedContext {
    let matches: Vec<QueryMatch> = results
        .into_iter()
        .filter(|m| scope.map_or(true, |id| m.metadata.video_id == id))
        .collect();

    let context = if matches.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        matches
            .iter()
            .map(|m| m.document.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    RetrievedContext { context, matches }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RecordMetadata;
    use crate::vector_store::{MemoryVectorStore, VectorStoreEntry};
    use async_trait::async_trait;
    use std::path::Path;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed_image(&self, _path: &Path) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        async fn embed_text(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }
    }

    fn hit(video_id: &str, document: &str) -> QueryMatch {
        QueryMatch {
            id: video_id.to_string(),
            document: document.to_string(),
            metadata: RecordMetadata {
                url: String::new(),
                text: document.to_string(),
                title: String::new(),
                video_id: video_id.to_string(),
            },
            distance: 0.0,
        }
    }

    #[test]
    fn test_unscoped_joins_documents() {
        let ctx = build_context(vec![hit("a", "one"), hit("b", "two")], None);
        assert_eq!(ctx.context, "one\n\ntwo");
        assert_eq!(ctx.matches.len(), 2);
    }

    #[test]
    fn test_scope_filters_matches() {
        let ctx = build_context(vec![hit("a", "one"), hit("b", "two")], Some("b"));
        assert_eq!(ctx.context, "two");
    }

    #[test]
    fn test_scope_with_no_match_uses_fallback() {
        let ctx = build_context(vec![hit("a", "one")], Some("zzz"));
        assert!(ctx.is_empty());
        assert_eq!(ctx.context, "No relevant context found.");
    }

    #[test]
    fn test_empty_store_uses_fallback() {
        assert_eq!(build_context(Vec::new(), None).context, NO_CONTEXT);
    }

    #[tokio::test]
    async fn test_retrieve_ranks_by_similarity() {
        let store = Arc::new(MemoryVectorStore::new());
        for (id, embedding) in [("near", vec![1.0, 0.0]), ("far", vec![0.0, 1.0])] {
            store
                .add(&VectorStoreEntry {
                    id: id.to_string(),
                    embedding,
                    document: format!("{} doc", id),
                    metadata: hit(id, "").metadata,
                })
                .await
                .unwrap();
        }

        let retriever = Retriever::new(store, Arc::new(FixedEmbedder(vec![1.0, 0.1])));
        let ctx = retriever.retrieve("question", None, 1).await.unwrap();
        assert_eq!(ctx.context, "near doc");
    }
}
