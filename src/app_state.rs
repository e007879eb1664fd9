use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    repositories::SqliteChunkRepository,
    services::{
        EmbeddingBackend, ExtractionService, GenerationBackend, OllamaBackend, OllamaEmbeddings,
        QuizService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub extraction_service: Arc<ExtractionService>,
    pub quiz_service: Arc<QuizService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let embeddings: Arc<dyn EmbeddingBackend> = Arc::new(OllamaEmbeddings::new(&config)?);
        let chunk_repository =
            Arc::new(SqliteChunkRepository::open(&config.index_path, embeddings).await?);

        let backend: Arc<dyn GenerationBackend> = Arc::new(OllamaBackend::new(&config)?);
        let quiz_service = Arc::new(QuizService::new(chunk_repository, backend));
        let extraction_service = Arc::new(ExtractionService::new(&config.ocr_binary));

        Ok(Self {
            extraction_service,
            quiz_service,
            config: Arc::new(config),
        })
    }
}
