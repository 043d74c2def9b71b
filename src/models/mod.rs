pub mod feedback;
pub mod identity;
pub mod quiz;

pub use feedback::{FeedbackKind, FeedbackReport, NewFeedback};
pub use identity::Identity;
pub use quiz::{NewQuiz, Quiz, QuizItem};
