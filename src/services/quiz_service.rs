use std::sync::Arc;

use chrono::Duration;
use rand::seq::SliceRandom;

use crate::errors::{AppError, AppResult};
use crate::models::domain::Quiz;
use crate::repositories::ChunkRepository;
use crate::services::generation_backend::GenerationBackend;

/// First chunks of the document used as the initial generation context: a
/// cheap, deterministic proxy for introductory material.
const INITIAL_CONTEXT_CHUNKS: usize = 3;

/// Neighborhood size retrieved around the random seed chunk for follow-up
/// batches.
const SIMILAR_CONTEXT_CHUNKS: usize = 5;

/// Orchestrates the RAG quiz pipeline: populates the session vector store,
/// selects generation context, and delegates to the generation backend.
pub struct QuizService {
    chunks: Arc<dyn ChunkRepository>,
    backend: Arc<dyn GenerationBackend>,
}

impl QuizService {
    pub fn new(chunks: Arc<dyn ChunkRepository>, backend: Arc<dyn GenerationBackend>) -> Self {
        Self { chunks, backend }
    }

    /// Resets and repopulates the store for `session_id`, then generates the
    /// first batch of questions from the opening chunks.
    pub async fn generate_initial(
        &self,
        session_id: &str,
        text_chunks: &[String],
        num_questions: usize,
    ) -> AppResult<Quiz> {
        log::info!(
            "starting session {}: storing {} chunks",
            session_id,
            text_chunks.len()
        );

        self.chunks.reset(session_id).await?;
        self.chunks.add(session_id, text_chunks).await?;

        let context = text_chunks
            .iter()
            .take(INITIAL_CONTEXT_CHUNKS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        self.backend.generate(&context, num_questions, &[]).await
    }

    /// Generates a follow-up batch for an existing session, excluding the
    /// questions already asked. The similarity seed chunk is picked uniformly
    /// at random, so repeated calls explore different regions of the
    /// document.
    pub async fn generate_more(
        &self,
        session_id: &str,
        asked_questions: &[String],
        num_questions: usize,
    ) -> AppResult<Quiz> {
        log::info!("fetching more questions for session {}", session_id);

        let all_chunks = self.chunks.get_all(session_id).await?;
        let seed = all_chunks
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))?;

        let similar = self
            .chunks
            .query_similar(session_id, seed, SIMILAR_CONTEXT_CHUNKS)
            .await?;
        let context = similar.join("\n");

        self.backend
            .generate(&context, num_questions, asked_questions)
            .await
    }

    /// Drops chunks whose session has been inactive longer than `ttl`.
    pub async fn purge_expired(&self, ttl: Duration) -> AppResult<usize> {
        self.chunks.purge_expired(ttl).await
    }
}
