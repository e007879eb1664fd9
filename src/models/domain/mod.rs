pub mod quiz;

pub use quiz::{Quiz, QuizQuestion};
