use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::constants::quiz_prompt::build_quiz_prompt;
use crate::errors::{AppError, AppResult};
use crate::models::domain::Quiz;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// External text-generation service producing structured quiz output.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Builds the instruction prompt from `context`, the requested question
    /// count and the exclusion list, invokes the backend, and parses the
    /// structured result.
    async fn generate(
        &self,
        context: &str,
        num_questions: usize,
        asked_questions: &[String],
    ) -> AppResult<Quiz>;
}

/// Ollama-compatible generation endpoint in structured-output mode.
pub struct OllamaBackend {
    client: reqwest::Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(config: &Config) -> AppResult<Self> {
        // A client without the configured timeout would silently drop the
        // latency bound; a build failure has to surface at startup.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/api/generate", config.backend_url),
            model: config.model_name.clone(),
        })
    }

    async fn send(&self, prompt: &str) -> AppResult<GenerateResponse> {
        let response = self
            .client
            .post(&self.url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                format: "json",
            })
            .send()
            .await?
            .error_for_status()?;

        // A response envelope without the expected field is model
        // misbehavior, not a transport failure; it must not be retried.
        response
            .json::<GenerateResponse>()
            .await
            .map_err(|err| AppError::MalformedGenerationOutput(err.to_string()))
    }

    /// Bounded retry with exponential backoff on transport failures only.
    async fn send_with_retry(&self, prompt: &str) -> AppResult<GenerateResponse> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 1;
        loop {
            match self.send(prompt).await {
                Ok(response) => return Ok(response),
                Err(AppError::GenerationBackendError(message)) if attempt < MAX_ATTEMPTS => {
                    log::warn!(
                        "generation attempt {}/{} failed: {}",
                        attempt,
                        MAX_ATTEMPTS,
                        message
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(
        &self,
        context: &str,
        num_questions: usize,
        asked_questions: &[String],
    ) -> AppResult<Quiz> {
        let prompt = build_quiz_prompt(context, num_questions, asked_questions);
        log::debug!("sending generation request to {}", self.url);

        let envelope = self.send_with_retry(&prompt).await?;
        let quiz = parse_quiz(&envelope.response)?;

        log::info!("quiz generated with {} questions", quiz.questions.len());
        Ok(quiz)
    }
}

/// Parses the backend payload as the quiz shape, requiring the top-level
/// "questions" key.
pub fn parse_quiz(payload: &str) -> AppResult<Quiz> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|err| AppError::MalformedGenerationOutput(format!("not valid JSON: {}", err)))?;

    if value.get("questions").is_none() {
        return Err(AppError::MalformedGenerationOutput(
            "missing 'questions' key".to_string(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|err| AppError::MalformedGenerationOutput(err.to_string()))
}
