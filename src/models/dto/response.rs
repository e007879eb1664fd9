use serde::Serialize;

use crate::models::domain::Quiz;

#[derive(Debug, Serialize)]
pub struct StartQuizSessionResponse {
    pub session_id: String,
    pub quiz: Quiz,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
