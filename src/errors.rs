use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to extract text: {0}")]
    ExtractionError(String),

    #[error("Could not extract text from the document")]
    NoExtractableText,

    #[error("Text was too short to be chunked")]
    EmptyChunkSet,

    #[error("Session '{0}' not found or has no documents")]
    SessionNotFound(String),

    #[error("Generation backend error: {0}")]
    GenerationBackendError(String),

    #[error("Malformed generation output: {0}")]
    MalformedGenerationOutput(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::ExtractionError(_) => "EXTRACTION_ERROR",
            AppError::NoExtractableText => "NO_EXTRACTABLE_TEXT",
            AppError::EmptyChunkSet => "EMPTY_CHUNK_SET",
            AppError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AppError::GenerationBackendError(_) => "GENERATION_BACKEND_ERROR",
            AppError::MalformedGenerationOutput(_) => "MALFORMED_GENERATION_OUTPUT",
            AppError::StorageError(_) => "STORAGE_ERROR",
        }
    }

    /// Bad-input failures carry their message to the caller; everything else
    /// is an internal failure whose detail stays in the logs.
    fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::UnsupportedFormat(_)
                | AppError::ExtractionError(_)
                | AppError::NoExtractableText
                | AppError::EmptyChunkSet
                | AppError::SessionNotFound(_)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFormat(_)
            | AppError::ExtractionError(_)
            | AppError::NoExtractableText
            | AppError::EmptyChunkSet => StatusCode::BAD_REQUEST,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::GenerationBackendError(_)
            | AppError::MalformedGenerationOutput(_)
            | AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_user_facing() {
            self.to_string()
        } else {
            log::error!("internal processing error [{}]: {}", self.error_code(), self);
            "An internal processing error occurred".to_string()
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: message,
            code: self.status_code().as_u16(),
        })
    }
}

impl From<tokio_rusqlite::Error> for AppError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::GenerationBackendError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::UnsupportedFormat("text/csv".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::EmptyChunkSet.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::SessionNotFound("abc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::GenerationBackendError("timeout".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::MalformedGenerationOutput("bad json".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages() {
        let err = AppError::UnsupportedFormat("text/csv".into());
        assert_eq!(err.to_string(), "Unsupported file type: text/csv");

        let err = AppError::SessionNotFound("abc".into());
        assert_eq!(
            err.to_string(),
            "Session 'abc' not found or has no documents"
        );
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = AppError::StorageError("index corrupted at page 3".into());
        assert!(!err.is_user_facing());

        let err = AppError::NoExtractableText;
        assert!(err.is_user_facing());
    }
}
