use serde::Deserialize;

/// Body of the follow-up questions endpoint. The asked-questions list is an
/// opaque exclusion list: not deduplicated or validated here.
#[derive(Debug, Clone, Deserialize)]
pub struct NextQuestionsRequest {
    #[serde(default)]
    pub asked_questions: Vec<String>,
}
