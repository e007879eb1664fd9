use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::{Mutex, RwLock};

use questionmate_server::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{Quiz, QuizQuestion},
    repositories::ChunkRepository,
    services::{chunking_service, GenerationBackend, OllamaBackend, QuizService},
};

struct InMemoryChunkRepository {
    sessions: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryChunkRepository {
    fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ChunkRepository for InMemoryChunkRepository {
    async fn reset(&self, session_id: &str) -> AppResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn add(&self, session_id: &str, chunks: &[String]) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .extend(chunks.iter().cloned());
        Ok(())
    }

    async fn query_similar(
        &self,
        session_id: &str,
        _query_text: &str,
        k: usize,
    ) -> AppResult<Vec<String>> {
        let sessions = self.sessions.read().await;
        let chunks = sessions
            .get(session_id)
            .filter(|chunks| !chunks.is_empty())
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;
        Ok(chunks.iter().take(k).cloned().collect())
    }

    async fn get_all(&self, session_id: &str) -> AppResult<Vec<String>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .filter(|chunks| !chunks.is_empty())
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))
    }

    async fn purge_expired(&self, _ttl: Duration) -> AppResult<usize> {
        Ok(0)
    }
}

/// Records every generation call and answers with a fixed quiz.
struct StubBackend {
    quiz: Quiz,
    calls: Mutex<Vec<(String, usize, Vec<String>)>>,
}

impl StubBackend {
    fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn generate(
        &self,
        context: &str,
        num_questions: usize,
        asked_questions: &[String],
    ) -> AppResult<Quiz> {
        self.calls.lock().await.push((
            context.to_string(),
            num_questions,
            asked_questions.to_vec(),
        ));
        Ok(self.quiz.clone())
    }
}

fn paris_text() -> &'static str {
    "Paris is the capital of France. It is known for the Eiffel Tower."
}

fn paris_quiz() -> Quiz {
    let mut options = BTreeMap::new();
    options.insert("A".to_string(), "Paris".to_string());
    options.insert("B".to_string(), "Lyon".to_string());
    options.insert("C".to_string(), "Marseille".to_string());
    options.insert("D".to_string(), "Nice".to_string());

    Quiz {
        questions: vec![QuizQuestion {
            question: "What is the capital of France?".to_string(),
            options,
            correct_answer: "A".to_string(),
            reference: "Paris is the capital of France.".to_string(),
        }],
    }
}

#[tokio::test]
async fn end_to_end_initial_quiz_from_single_chunk_document() {
    let text_chunks = chunking_service::chunk(paris_text());
    assert_eq!(text_chunks.len(), 1, "expected the document to fit one chunk");

    let repo = Arc::new(InMemoryChunkRepository::new());
    let backend = Arc::new(StubBackend::new(paris_quiz()));
    let service = QuizService::new(repo.clone(), backend.clone());

    let quiz = service
        .generate_initial("session-1", &text_chunks, 1)
        .await
        .unwrap();

    assert_eq!(quiz.questions.len(), 1);
    assert!(
        text_chunks[0].contains(&quiz.questions[0].reference),
        "reference must be a substring of the stored chunk"
    );

    // The chunk landed in the store and was the whole generation context.
    assert_eq!(repo.get_all("session-1").await.unwrap(), text_chunks);
    let calls = backend.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, text_chunks[0]);
    assert!(calls[0].2.is_empty());
}

#[tokio::test]
async fn generate_more_fails_for_session_with_no_chunks() {
    let repo = Arc::new(InMemoryChunkRepository::new());
    let backend = Arc::new(StubBackend::new(paris_quiz()));
    let service = QuizService::new(repo, backend);

    let err = service
        .generate_more("unknown-session", &[], 5)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SessionNotFound(_)));
}

#[tokio::test]
async fn generate_more_passes_exclusion_list_and_stays_in_session() {
    let repo = Arc::new(InMemoryChunkRepository::new());
    let backend = Arc::new(StubBackend::new(paris_quiz()));
    let service = QuizService::new(repo.clone(), backend.clone());

    let stored: Vec<String> = (0..8).map(|i| format!("session chunk {}", i)).collect();
    repo.add("session-1", &stored).await.unwrap();

    let asked = vec!["What is chunk 3?".to_string(), "What is chunk 5?".to_string()];
    let quiz = service.generate_more("session-1", &asked, 5).await.unwrap();
    assert_eq!(quiz.questions.len(), 1);

    let calls = backend.calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].2, asked);
    // Context lines all come from the session's chunk set, at most 5 of them.
    let context_lines: Vec<&str> = calls[0].0.split('\n').collect();
    assert!(context_lines.len() <= 5);
    for line in context_lines {
        assert!(stored.iter().any(|c| c == line), "foreign context line: {line}");
    }
}

#[tokio::test]
async fn malformed_backend_payload_never_yields_a_silent_quiz() {
    let server = httpmock::MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(httpmock::Method::POST).path("/api/generate");
            then.status(200)
                .json_body(serde_json::json!({"response": "I am not JSON at all"}));
        })
        .await;

    let config = Config {
        index_path: "unused".to_string(),
        backend_url: server.base_url(),
        model_name: "llama3:8b".to_string(),
        embedding_model_name: "nomic-embed-text".to_string(),
        ocr_binary: "tesseract".to_string(),
        web_server_host: "127.0.0.1".to_string(),
        web_server_port: 0,
        session_ttl_hours: 1,
        backend_timeout_secs: 5,
    };

    let repo = Arc::new(InMemoryChunkRepository::new());
    repo.add("session-1", &[paris_text().to_string()]).await.unwrap();

    let service = QuizService::new(repo, Arc::new(OllamaBackend::new(&config).unwrap()));

    let err = service
        .generate_initial("session-1", &[paris_text().to_string()], 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MalformedGenerationOutput(_)));

    let err = service.generate_more("session-1", &[], 1).await.unwrap_err();
    assert!(matches!(err, AppError::MalformedGenerationOutput(_)));
}
