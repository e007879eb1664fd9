use std::collections::BTreeMap;

use crate::models::domain::{Quiz, QuizQuestion};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// A well-formed quiz with a single question about Paris, whose
    /// reference is verbatim from [`paris_chunk`].
    pub fn one_question_quiz() -> Quiz {
        Quiz {
            questions: vec![paris_question()],
        }
    }

    pub fn paris_question() -> QuizQuestion {
        let mut options = BTreeMap::new();
        options.insert("A".to_string(), "Paris".to_string());
        options.insert("B".to_string(), "Lyon".to_string());
        options.insert("C".to_string(), "Marseille".to_string());
        options.insert("D".to_string(), "Nice".to_string());

        QuizQuestion {
            question: "What is the capital of France?".to_string(),
            options,
            correct_answer: "A".to_string(),
            reference: "Paris is the capital of France.".to_string(),
        }
    }

    pub fn paris_chunk() -> String {
        "Paris is the capital of France. It is known for the Eiffel Tower.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn fixture_reference_is_substring_of_chunk() {
        let question = paris_question();
        assert!(paris_chunk().contains(&question.reference));
    }

    #[test]
    fn fixture_quiz_has_four_labeled_options() {
        let quiz = one_question_quiz();
        let options = &quiz.questions[0].options;
        assert_eq!(options.len(), 4);
        assert!(options.contains_key(&quiz.questions[0].correct_answer));
    }
}
