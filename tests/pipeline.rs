//! End-to-end ingestion against mocked providers.

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vidmind::config::{EmbeddingSettings, Prompts, Settings, TranscriptionSettings};
use vidmind::embedding::ClipEmbedder;
use vidmind::media::{frame_file_name, DownloadedVideo, FrameSampler, MediaSource};
use vidmind::orchestrator::{IngestOutcome, Orchestrator};
use vidmind::rag::{Answerer, ChatMessage, Generation, Session};
use vidmind::storage::{load_embedding_record, video_id, DataLayout};
use vidmind::transcription::{AssemblyAiTranscriber, PollPolicy};
use vidmind::vector_store::{SqliteVectorStore, VectorStore};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIMS: usize = 512;
const URL: &str = "https://x/watch?v=abc";

/// Writes placeholder files where yt-dlp and ffmpeg would.
struct FakeMedia {
    downloads: PathBuf,
}

#[async_trait]
impl MediaSource for FakeMedia {
    async fn download_video(&self, _url: &str, id: &str) -> vidmind::Result<DownloadedVideo> {
        std::fs::create_dir_all(&self.downloads)?;
        let path = self.downloads.join(format!("{}.mp4", id));
        std::fs::write(&path, b"video")?;
        Ok(DownloadedVideo { path, title: None })
    }

    async fn extract_audio(&self, _video: &Path, output: &Path) -> vidmind::Result<PathBuf> {
        std::fs::write(output, b"ID3 audio")?;
        Ok(output.to_path_buf())
    }
}

/// Produces two frames, as if a 10 s clip were sampled every 5 s at 30 fps.
struct TwoFrames;

#[async_trait]
impl FrameSampler for TwoFrames {
    async fn sample(&self, _: &Path, output_dir: &Path, _: f64) -> vidmind::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;
        let mut frames = Vec::new();
        for index in [0, 150] {
            let path = output_dir.join(frame_file_name(index));
            std::fs::write(&path, format!("jpeg {}", index))?;
            frames.push(path);
        }
        Ok(frames)
    }
}

fn axis(i: usize) -> Vec<f32> {
    let mut v = vec![0.0; DIMS];
    v[i] = 1.0;
    v
}

fn embedding_body(vector: Vec<f32>) -> serde_json::Value {
    json!({ "data": [{ "index": 0, "embedding": vector }] })
}

async fn mock_providers(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/upload"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"upload_url": "https://cdn/a"})),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/transcript"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "job-9"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/transcript/job-9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "completed", "text": "hello world"})),
        )
        .mount(server)
        .await;

    // Text inputs land on axis 0, images on axis 1
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(json!({"input": [{"text": "hello world"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(axis(0))))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(axis(1))))
        .with_priority(5)
        .mount(server)
        .await;
}

async fn build(server: &MockServer, root: &Path) -> (Orchestrator, Arc<SqliteVectorStore>) {
    let mut settings = Settings::default();
    settings.general.data_dir = root.display().to_string();

    let transcriber = AssemblyAiTranscriber::with_api_key(
        &TranscriptionSettings {
            base_url: server.uri(),
            ..TranscriptionSettings::default()
        },
        "test-key",
    )
    .unwrap()
    .with_poll_policy(PollPolicy {
        interval: Duration::from_millis(10),
        backoff_factor: 1.0,
        max_interval: Duration::from_millis(10),
        timeout: Some(Duration::from_secs(5)),
    });

    let embedder = ClipEmbedder::new(&EmbeddingSettings {
        base_url: format!("{}/v1", server.uri()),
        ..EmbeddingSettings::default()
    })
    .unwrap()
    .with_api_key(None);

    let layout = DataLayout::new(root);
    let store = Arc::new(SqliteVectorStore::new(&root.join("vectors.db")).unwrap());

    let orchestrator = Orchestrator::with_components(
        settings,
        Prompts::default(),
        layout.clone(),
        Arc::new(FakeMedia {
            downloads: layout.downloads_dir(),
        }),
        Arc::new(TwoFrames),
        Arc::new(transcriber),
        Arc::new(embedder),
        store.clone(),
    );

    (orchestrator, store)
}

#[tokio::test]
async fn test_ingest_writes_fused_record() {
    let server = MockServer::start().await;
    mock_providers(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, store) = build(&server, dir.path()).await;

    let outcome = orchestrator.ingest(URL, &CancellationToken::new()).await.unwrap();
    let record = match outcome {
        IngestOutcome::Ingested(record) => record,
        other => panic!("ingest did not complete: {:?}", other),
    };

    let id = video_id(URL);
    assert_eq!(record.id, id);
    assert_eq!(record.embedding.len(), DIMS);
    // Mean of one text vector and two frame vectors
    assert!((record.embedding[0] - 1.0 / 3.0).abs() < 1e-6);
    assert!((record.embedding[1] - 2.0 / 3.0).abs() < 1e-6);

    let stored = load_embedding_record(orchestrator.layout(), &id).unwrap();
    assert_eq!(stored.video_id, id);
    assert_eq!(stored.embedding.len(), DIMS);
    assert_eq!(stored.metadata.text, "hello world");
    assert_eq!(stored.metadata.title, "Unknown Title");
    assert_eq!(stored.metadata.url, URL);

    assert!(orchestrator.layout().audio_path(&id).exists());
    assert!(orchestrator
        .layout()
        .frames_dir(&id)
        .join("frame_150.jpg")
        .exists());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_reingest_overwrites() {
    let server = MockServer::start().await;
    mock_providers(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, store) = build(&server, dir.path()).await;

    let cancel = CancellationToken::new();
    orchestrator.ingest(URL, &cancel).await.unwrap();
    orchestrator.ingest(URL, &cancel).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
}

/// Answers with the retrieved context so tests can see what was retrieved.
struct EchoAnswerer;

#[async_trait]
impl Answerer for EchoAnswerer {
    async fn answer(&self, context: &str, _: &[ChatMessage], _: &str) -> Generation {
        Generation::Generated(context.to_string())
    }
}

#[tokio::test]
async fn test_ask_respects_video_scope() {
    let server = MockServer::start().await;
    mock_providers(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let (orchestrator, _store) = build(&server, dir.path()).await;
    let orchestrator = orchestrator.with_answerer(Arc::new(EchoAnswerer));

    orchestrator.ingest(URL, &CancellationToken::new()).await.unwrap();

    let mut scoped = Session::new(Some(video_id(URL)));
    let answer = orchestrator.ask(&mut scoped, "what was said?").await.unwrap();
    assert_eq!(answer.generation.text(), "hello world");
    assert_eq!(scoped.history.len(), 2);

    let mut elsewhere = Session::new(Some(video_id("https://x/watch?v=other")));
    let answer = orchestrator.ask(&mut elsewhere, "what was said?").await.unwrap();
    assert_eq!(answer.generation.text(), "No relevant context found.");
}
