//! 答题会话
//!
//! 一个测验对应一个会话，封装"作答 → 提交 → 重试"的状态流转。

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{AppResult, ValidationError};
use crate::models::Quiz;
use crate::services::QuizRepository;
use crate::utils::logging;

/// 会话模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Answering,
    Submitted,
    /// 只读预览，直接显示正确答案
    Preview,
}

/// 选项的显示提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Selected,
    Correct,
    Incorrect,
    Dimmed,
}

/// 答题会话
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    mode: SessionMode,
    /// 题目位置 → 选中的选项
    answers: BTreeMap<usize, String>,
    score: Option<usize>,
}

impl QuizSession {
    pub fn new(quiz: Quiz, preview: bool) -> Self {
        let mode = if preview {
            SessionMode::Preview
        } else {
            SessionMode::Answering
        };
        Self {
            quiz,
            mode,
            answers: BTreeMap::new(),
            score: None,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.answers
    }

    pub fn score(&self) -> Option<usize> {
        self.score
    }

    /// 全部答对
    pub fn is_perfect(&self) -> bool {
        self.score == Some(self.quiz.len())
    }

    /// 选择某题的选项
    ///
    /// 只在作答中生效，返回是否记录了本次选择。
    pub fn select(&mut self, position: usize, option: impl Into<String>) -> bool {
        if self.mode != SessionMode::Answering || position >= self.quiz.len() {
            return false;
        }
        self.answers.insert(position, option.into());
        true
    }

    /// 提交答案
    ///
    /// 先给回答数 +1，成功后才计算分数并进入已提交状态；
    /// 任何失败都不改变会话状态。
    pub async fn submit(&mut self, repo: &QuizRepository) -> AppResult<usize> {
        match self.mode {
            SessionMode::Preview => return Err(ValidationError::PreviewReadOnly.into()),
            SessionMode::Submitted => return Err(ValidationError::AlreadySubmitted.into()),
            SessionMode::Answering => {}
        }

        let total = self.quiz.len();
        if self.answers.len() < total {
            return Err(ValidationError::Incomplete {
                answered: self.answers.len(),
                total,
            }
            .into());
        }

        repo.increment_response_count(&self.quiz.id).await?;

        let score = self
            .quiz
            .items
            .iter()
            .enumerate()
            .filter(|(i, item)| self.answers.get(i).is_some_and(|a| item.is_correct(a)))
            .count();

        self.score = Some(score);
        self.mode = SessionMode::Submitted;
        logging::log_session_result(&self.quiz.id, score, total);
        Ok(score)
    }

    /// 清空答案，重新作答
    pub fn retry(&mut self) -> Result<(), ValidationError> {
        if self.mode != SessionMode::Submitted {
            return Err(ValidationError::InvalidState { action: "retry" });
        }
        debug!("测验 {} 重新作答", self.quiz.id);
        self.answers.clear();
        self.score = None;
        self.mode = SessionMode::Answering;
        info!("🔄 已清空答案");
        Ok(())
    }

    pub fn option_mark(&self, position: usize, option: &str) -> OptionMark {
        let Some(item) = self.quiz.items.get(position) else {
            return OptionMark::Neutral;
        };
        let selected = self.answers.get(&position).is_some_and(|a| a == option);

        match self.mode {
            SessionMode::Preview if item.is_correct(option) => OptionMark::Correct,
            SessionMode::Preview => OptionMark::Neutral,
            SessionMode::Answering if selected => OptionMark::Selected,
            SessionMode::Answering => OptionMark::Neutral,
            SessionMode::Submitted if item.is_correct(option) => OptionMark::Correct,
            SessionMode::Submitted if selected => OptionMark::Incorrect,
            SessionMode::Submitted => OptionMark::Dimmed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, PersistenceError};
    use crate::infrastructure::MemoryStore;
    use crate::models::{NewQuiz, QuizItem};
    use std::sync::Arc;

    async fn saved_quiz(items: Vec<QuizItem>) -> (QuizRepository, Quiz) {
        let repo = QuizRepository::with_store(Arc::new(MemoryStore::new()));
        let new_quiz = NewQuiz::new("测验", "", "山田", items);
        let id = repo.create_quiz(&new_quiz).await.unwrap();
        (repo, new_quiz.into_quiz(id))
    }

    fn single() -> Vec<QuizItem> {
        vec![QuizItem::new("Q1", ["A", "B", "C", "D"], "A")]
    }

    #[tokio::test]
    async fn test_correct_answer_scores_one() {
        let (repo, quiz) = saved_quiz(single()).await;
        let mut session = QuizSession::new(quiz, false);

        assert!(session.select(0, "A"));
        assert_eq!(session.submit(&repo).await.unwrap(), 1);
        assert_eq!(session.mode(), SessionMode::Submitted);
        assert!(session.is_perfect());

        let quizzes = repo.list_quizzes().await.unwrap();
        assert_eq!(quizzes[0].responses(), 1);
    }

    #[tokio::test]
    async fn test_wrong_answer_and_retry() {
        let (repo, quiz) = saved_quiz(single()).await;
        let mut session = QuizSession::new(quiz, false);

        session.select(0, "B");
        assert_eq!(session.submit(&repo).await.unwrap(), 0);
        assert_eq!(session.option_mark(0, "A"), OptionMark::Correct);
        assert_eq!(session.option_mark(0, "B"), OptionMark::Incorrect);
        assert_eq!(session.option_mark(0, "C"), OptionMark::Dimmed);

        // 已提交后不能再选择或提交
        assert!(!session.select(0, "A"));
        let err = session.submit(&repo).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::AlreadySubmitted)
        ));

        session.retry().unwrap();
        assert_eq!(session.mode(), SessionMode::Answering);
        assert!(session.answers().is_empty());
        assert_eq!(session.score(), None);
    }

    #[tokio::test]
    async fn test_incomplete_keeps_selections() {
        let mut items = single();
        items.push(QuizItem::new("Q2", ["A", "B"], "B"));
        let (repo, quiz) = saved_quiz(items).await;
        let mut session = QuizSession::new(quiz, false);

        session.select(1, "B");
        let err = session.submit(&repo).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::Incomplete {
                answered: 1,
                total: 2
            })
        ));
        assert_eq!(session.mode(), SessionMode::Answering);
        assert_eq!(session.answers().get(&1).map(String::as_str), Some("B"));
        assert_eq!(repo.list_quizzes().await.unwrap()[0].responses(), 0);
    }

    #[tokio::test]
    async fn test_preview_is_read_only() {
        let (repo, quiz) = saved_quiz(single()).await;
        let mut session = QuizSession::new(quiz, true);

        assert!(!session.select(0, "B"));
        assert!(session.answers().is_empty());
        assert_eq!(session.option_mark(0, "A"), OptionMark::Correct);
        assert_eq!(session.option_mark(0, "B"), OptionMark::Neutral);
        assert!(session.submit(&repo).await.is_err());
        assert_eq!(session.mode(), SessionMode::Preview);
    }

    #[tokio::test]
    async fn test_failed_increment_does_not_transition() {
        let (repo, mut quiz) = saved_quiz(single()).await;
        quiz.id = "deleted".to_string();
        let mut session = QuizSession::new(quiz, false);

        session.select(0, "A");
        let err = session.submit(&repo).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Persistence(PersistenceError::NotFound { .. })
        ));
        assert_eq!(session.mode(), SessionMode::Answering);
        assert_eq!(session.score(), None);
    }

    #[test]
    fn test_select_out_of_range_ignored() {
        let quiz = NewQuiz::new("t", "", "me", single()).into_quiz("q1");
        let mut session = QuizSession::new(quiz, false);
        assert!(!session.select(3, "A"));
        assert!(session.select(0, "Z"));
        assert!(session.select(0, "B"));
        assert_eq!(session.option_mark(0, "B"), OptionMark::Selected);
        assert_eq!(session.option_mark(0, "A"), OptionMark::Neutral);
    }
}
