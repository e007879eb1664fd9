pub mod quiz_handler;

pub use quiz_handler::{health_check, next_questions, start_quiz_session};
