//! 持久化网关 - 业务能力层
//!
//! 把 Quiz / Feedback 映射到文档存储的两个集合上。
//! 失败时在这里记录日志并返回类型化错误，由上层决定如何提示用户；不做自动重试。

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::AppResult;
use crate::infrastructure::document_store::encode_fields;
use crate::infrastructure::{DocumentStore, OrderBy};
use crate::models::{FeedbackReport, NewFeedback, NewQuiz, Quiz};

const RESPONSE_COUNT_FIELD: &str = "responseCount";
const CREATED_AT_FIELD: &str = "createdAt";

/// 持久化网关
#[derive(Clone)]
pub struct QuizRepository {
    store: Arc<dyn DocumentStore>,
    quiz_collection: String,
    feedback_collection: String,
}

impl QuizRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        quiz_collection: impl Into<String>,
        feedback_collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            quiz_collection: quiz_collection.into(),
            feedback_collection: feedback_collection.into(),
        }
    }

    /// 使用默认集合名
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self::new(store, "quizzes", "feedback")
    }

    /// 保存新测验，返回分配的 ID
    pub async fn create_quiz(&self, quiz: &NewQuiz) -> AppResult<String> {
        quiz.validate()?;

        let fields = encode_fields(quiz)?;
        let id = self
            .store
            .create(&self.quiz_collection, fields, &[])
            .await
            .inspect_err(|e| error!("测验保存失败: {}", e))?;

        info!("✓ 测验已保存: {} ({} 题)", id, quiz.items.len());
        Ok(id)
    }

    /// 读取全部测验
    ///
    /// 无法解析的文档跳过并记录警告，不影响其他测验。
    pub async fn list_quizzes(&self) -> AppResult<Vec<Quiz>> {
        let docs = self
            .store
            .list(&self.quiz_collection, None)
            .await
            .inspect_err(|e| error!("测验列表读取失败: {}", e))?;

        let total = docs.len();
        let mut quizzes = Vec::with_capacity(total);
        for doc in docs {
            match doc.decode::<Quiz>() {
                Ok(mut quiz) => {
                    quiz.id = doc.id;
                    quizzes.push(quiz);
                }
                Err(e) => warn!("⚠️ 跳过无法解析的测验 {}: {}", doc.id, e),
            }
        }

        debug!("读取到 {}/{} 个测验", quizzes.len(), total);
        Ok(quizzes)
    }

    pub async fn delete_quiz(&self, id: &str) -> AppResult<()> {
        self.store
            .delete(&self.quiz_collection, id)
            .await
            .inspect_err(|e| error!("测验 {} 删除失败: {}", id, e))?;
        info!("🗑️ 测验已删除: {}", id);
        Ok(())
    }

    /// 回答数 +1
    pub async fn increment_response_count(&self, id: &str) -> AppResult<()> {
        self.store
            .increment(&self.quiz_collection, id, RESPONSE_COUNT_FIELD, 1)
            .await
            .inspect_err(|e| error!("测验 {} 回答数更新失败: {}", id, e))
    }

    /// 保存反馈，创建时间由服务端写入
    pub async fn create_feedback(&self, feedback: &NewFeedback) -> AppResult<String> {
        let fields = encode_fields(feedback)?;
        let id = self
            .store
            .create(&self.feedback_collection, fields, &[CREATED_AT_FIELD])
            .await
            .inspect_err(|e| error!("反馈提交失败: {}", e))?;
        info!("✓ 反馈已保存: {}", id);
        Ok(id)
    }

    /// 读取全部反馈，按创建时间倒序
    pub async fn list_feedback(&self) -> AppResult<Vec<FeedbackReport>> {
        let order = OrderBy::desc(CREATED_AT_FIELD);
        let docs = self
            .store
            .list(&self.feedback_collection, Some(&order))
            .await
            .inspect_err(|e| error!("反馈列表读取失败: {}", e))?;

        docs.into_iter()
            .map(|doc| {
                let mut report: FeedbackReport = doc.decode()?;
                report.id = doc.id;
                Ok(report)
            })
            .collect()
    }
}
