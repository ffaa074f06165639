//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs and ranked in Rust by cosine
//! distance. The collection is small (one row per video), so a full scan is fine.

use super::{rank_entries, QueryMatch, VectorStore, VectorStoreEntry};
use crate::error::{Result, VidmindError};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS entries (
        id TEXT PRIMARY KEY,
        embedding BLOB NOT NULL,
        document TEXT NOT NULL,
        metadata TEXT NOT NULL,
        added_at TEXT NOT NULL
    );
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VidmindError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn load_all(&self) -> Result<Vec<VectorStoreEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, embedding, document, metadata FROM entries")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, blob, document, metadata) = row?;
            entries.push(VectorStoreEntry {
                id,
                embedding: Self::bytes_to_embedding(&blob),
                document,
                metadata: serde_json::from_str(&metadata)?,
            });
        }
        Ok(entries)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, entry), fields(id = %entry.id))]
    async fn add(&self, entry: &VectorStoreEntry) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO entries (id, embedding, document, metadata, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entry.id,
                Self::embedding_to_bytes(&entry.embedding),
                entry.document,
                serde_json::to_string(&entry.metadata)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!("Stored vector entry");
        Ok(())
    }

    async fn query(&self, query_embedding: &[f32], n_results: usize) -> Result<Vec<QueryMatch>> {
        let entries = self.load_all()?;
        Ok(rank_entries(entries.iter(), query_embedding, n_results))
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
