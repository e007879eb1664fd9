use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A generated quiz. Transient: produced by the generation pipeline, returned
/// to the caller, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub question: String,
    /// Option label (A-D) to option text. A BTreeMap keeps labels unique and
    /// serializes them in label order.
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    /// Supporting excerpt, ideally verbatim from a stored chunk.
    pub reference: String,
}
