use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// 一道选择题
///
/// 没有独立的 ID，在所属测验中的位置就是它唯一的引用方式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    /// 正确答案，必须与 `options` 中的某一项完全一致
    pub answer: String,
}

impl QuizItem {
    pub fn new(
        question: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
            answer: answer.into(),
        }
    }

    /// 正确答案是否在选项中
    pub fn is_valid(&self) -> bool {
        self.options.iter().any(|o| o == &self.answer)
    }

    pub fn is_correct(&self, option: &str) -> bool {
        self.answer == option
    }
}

/// 已保存的测验
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    /// 文档 ID，由存储层分配，不作为字段写入
    #[serde(default, skip_serializing)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub items: Vec<QuizItem>,
    #[serde(default)]
    pub creator: String,
    /// ISO-8601 字符串
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_count: Option<u64>,
}

impl Quiz {
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn responses(&self) -> u64 {
        self.response_count.unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 待保存的测验（尚未分配 ID）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuiz {
    pub title: String,
    pub description: String,
    pub items: Vec<QuizItem>,
    pub creator: String,
    pub created_at: String,
}

impl NewQuiz {
    /// 以当前时间作为创建时间
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        creator: impl Into<String>,
        items: Vec<QuizItem>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            items,
            creator: creator.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// 保存前的校验：至少一道题，且每道题的答案都在选项中
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "title" });
        }
        if self.items.is_empty() {
            return Err(ValidationError::EmptyQuiz);
        }
        if let Some(position) = self.items.iter().position(|item| !item.is_valid()) {
            return Err(ValidationError::AnswerNotInOptions { position });
        }
        Ok(())
    }

    pub fn into_quiz(self, id: impl Into<String>) -> Quiz {
        Quiz {
            id: id.into(),
            title: self.title,
            description: self.description,
            items: self.items,
            creator: self.creator,
            created_at: self.created_at,
            response_count: None,
        }
    }
}
