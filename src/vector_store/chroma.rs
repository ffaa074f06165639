//! Chroma server backend over its REST API.

use super::{QueryMatch, VectorStore, VectorStoreEntry};
use crate::error::{Result, VidmindError};
use crate::openai::http_client;
use crate::storage::RecordMetadata;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<RecordMetadata>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

/// Vector store backed by a Chroma collection created in cosine space.
pub struct ChromaVectorStore {
    http: reqwest::Client,
    base_url: String,
    collection_id: String,
}

impl ChromaVectorStore {
    /// Get or create `collection` on the server at `base_url`.
    #[instrument]
    pub async fn connect(base_url: &str, collection: &str) -> Result<Self> {
        let http = http_client()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let response = http
            .post(format!("{}/api/v1/collections", base_url))
            .json(&json!({
                "name": collection,
                "metadata": { "hnsw:space": "cosine" },
                "get_or_create": true,
            }))
            .send()
            .await?;
        let response = check(response).await?;
        let created: CollectionResponse = response.json().await?;

        info!("Using Chroma collection {} ({})", collection, created.id);

        Ok(Self {
            http,
            base_url,
            collection_id: created.id,
        })
    }

    fn url(&self, action: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{}",
            self.base_url, self.collection_id, action
        )
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(VidmindError::VectorStore(format!(
        "Chroma returned {}: {}",
        status, body
    )))
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    #[instrument(skip(self, entry), fields(id = %entry.id))]
    async fn add(&self, entry: &VectorStoreEntry) -> Result<()> {
        let response = self
            .http
            .post(self.url("upsert"))
            .json(&json!({
                "ids": [entry.id],
                "embeddings": [entry.embedding],
                "documents": [entry.document],
                "metadatas": [entry.metadata],
            }))
            .send()
            .await?;
        check(response).await?;
        debug!("Upserted entry into Chroma");
        Ok(())
    }

    async fn query(&self, query_embedding: &[f32], n_results: usize) -> Result<Vec<QueryMatch>> {
        let response = self
            .http
            .post(self.url("query"))
            .json(&json!({
                "query_embeddings": [query_embedding],
                "n_results": n_results,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await?;
        let parsed: QueryResponse = check(response).await?.json().await?;

        // One query embedding, so only the first result list matters
        let ids = parsed.ids.into_iter().next().unwrap_or_default();
        let mut documents = parsed
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default()
            .into_iter();
        let mut metadatas = parsed
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default()
            .into_iter();
        let mut distances = parsed
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default()
            .into_iter();

        let mut matches = Vec::with_capacity(ids.len());
        for id in ids {
            let document = documents.next().flatten().unwrap_or_default();
            let metadata = metadatas.next().flatten().unwrap_or_else(|| RecordMetadata {
                url: String::new(),
                text: document.clone(),
                title: String::new(),
                video_id: id.clone(),
            });
            let distance = distances.next().unwrap_or(f32::MAX);
            matches.push(QueryMatch {
                id,
                document,
                metadata,
                distance,
            });
        }
        Ok(matches)
    }

    async fn count(&self) -> Result<usize> {
        let response = self.http.get(self.url("count")).send().await?;
        Ok(check(response).await?.json::<usize>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::tests::entry;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn connected(server: &MockServer) -> ChromaVectorStore {
        Mock::given(method("POST"))
            .and(path("/api/v1/collections"))
            .and(body_partial_json(json!({
                "name": "youtube_summarizer",
                "metadata": { "hnsw:space": "cosine" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "c0ffee",
                "name": "youtube_summarizer",
            })))
            .expect(1)
            .mount(server)
            .await;

        ChromaVectorStore::connect(&server.uri(), "youtube_summarizer")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_sends_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/collections/c0ffee/upsert"))
            .and(body_partial_json(json!({
                "ids": ["v1"],
                "metadatas": [{ "video_id": "v1" }],
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let store = connected(&server).await;
        store.add(&entry("v1", vec![1.0, 0.0])).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_parses_nested_lists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/collections/c0ffee/query"))
            .and(body_partial_json(json!({ "n_results": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ids": [["v1", "v2"]],
                "documents": [["first", "second"]],
                "metadatas": [[
                    { "url": "u1", "text": "first", "title": "T1", "video_id": "v1" },
                    { "url": "u2", "text": "second", "title": "T2", "video_id": "v2" }
                ]],
                "distances": [[0.1, 0.4]]
            })))
            .mount(&server)
            .await;

        let store = connected(&server).await;
        let matches = store.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].document, "first");
        assert_eq!(matches[1].metadata.video_id, "v2");
        assert!((matches[1].distance - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_server_error_is_vector_store_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/collections"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = ChromaVectorStore::connect(&server.uri(), "x").await;
        assert!(matches!(result, Err(VidmindError::VectorStore(_))));
    }
}
