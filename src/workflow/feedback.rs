//! 反馈表单

use tracing::info;

use crate::error::{AppResult, ValidationError};
use crate::models::{FeedbackKind, Identity, NewFeedback};
use crate::services::QuizRepository;

/// 正在填写的反馈
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub kind: FeedbackKind,
    pub content: String,
}

impl FeedbackDraft {
    pub fn new(kind: FeedbackKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    /// 提交反馈，成功后清空草稿
    ///
    /// 提交者的名称和邮箱取自当前登录用户。
    pub async fn submit(&mut self, repo: &QuizRepository, identity: &Identity) -> AppResult<String> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(ValidationError::MissingField { field: "content" }.into());
        }

        let feedback = NewFeedback::new(
            identity.display_name.clone(),
            identity.email.clone(),
            self.kind,
            content,
        );
        let id = repo.create_feedback(&feedback).await?;

        info!("📮 反馈已提交 ({})", self.kind.label());
        *self = Self::default();
        Ok(id)
    }
}
