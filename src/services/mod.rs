pub mod chunking_service;
pub mod embedding_backend;
pub mod extraction_service;
pub mod generation_backend;
pub mod quiz_service;

pub use embedding_backend::{EmbeddingBackend, OllamaEmbeddings};
pub use extraction_service::ExtractionService;
pub use generation_backend::{GenerationBackend, OllamaBackend};
pub use quiz_service::QuizService;
