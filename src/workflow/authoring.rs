//! 测验制作流程
//!
//! 上传 PDF → 抽取文本 → AI 出题 → 审阅修改 → 保存 / 导出脚本。
//! 抽取、生成、保存失败时进入 `Error` 状态，可以通过 `reset` 重新开始；
//! 校验错误不改变任何状态。

use tracing::{error, info, warn};

use crate::error::{AppError, AppResult, ValidationError};
use crate::models::{NewQuiz, Quiz, QuizItem};
use crate::services::{export_form_script, PdfExtractor, QuizGenerator, QuizRepository};

pub const MIN_QUESTION_COUNT: usize = 1;
pub const MAX_QUESTION_COUNT: usize = 10;
pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// 流程状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthoringStatus {
    #[default]
    Idle,
    Extracting,
    Generating,
    /// 题目已生成，等待审阅
    Ready,
    /// 脚本已生成
    Done,
    Error(String),
}

impl AuthoringStatus {
    fn is_reviewable(&self) -> bool {
        matches!(self, AuthoringStatus::Ready | AuthoringStatus::Done)
    }
}

/// 上传的 PDF
#[derive(Debug, Clone)]
struct SourceFile {
    name: String,
    bytes: Vec<u8>,
}

/// 测验制作流程
#[derive(Debug, Clone)]
pub struct AuthoringFlow {
    status: AuthoringStatus,
    file: Option<SourceFile>,
    title: String,
    description: String,
    creator: String,
    question_count: usize,
    items: Vec<QuizItem>,
    saved: Option<Quiz>,
    share_url: Option<String>,
    script: Option<String>,
}

impl Default for AuthoringFlow {
    fn default() -> Self {
        Self {
            status: AuthoringStatus::Idle,
            file: None,
            title: String::new(),
            description: String::new(),
            creator: String::new(),
            question_count: DEFAULT_QUESTION_COUNT,
            items: Vec::new(),
            saved: None,
            share_url: None,
            script: None,
        }
    }
}

impl AuthoringFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &AuthoringStatus {
        &self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.name.as_str())
    }

    pub fn saved_quiz(&self) -> Option<&Quiz> {
        self.saved.as_ref()
    }

    pub fn share_url(&self) -> Option<&str> {
        self.share_url.as_deref()
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// 选择 PDF 文件
    ///
    /// 标题和说明为空时根据文件名填入默认值。
    pub fn select_file(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        let name = name.into();
        if self.title.trim().is_empty() {
            self.title = format!("基于「{}」的测验", name);
        }
        if self.description.trim().is_empty() {
            self.description = format!("本测验由 AI 根据 PDF「{}」的内容自动生成。", name);
        }
        info!("📄 已选择文件: {} ({} 字节)", name, bytes.len());
        self.file = Some(SourceFile { name, bytes });
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_creator(&mut self, creator: impl Into<String>) {
        self.creator = creator.into();
    }

    /// 设置题目数量，超出范围时取边界值
    pub fn set_question_count(&mut self, count: usize) {
        self.question_count = count.clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT);
    }

    /// 抽取文本并生成题目
    pub async fn start_generation(
        &mut self,
        extractor: &PdfExtractor,
        generator: &QuizGenerator,
    ) -> AppResult<()> {
        let Some(file) = self.file.clone() else {
            return Err(ValidationError::MissingField { field: "file" }.into());
        };
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "title" }.into());
        }

        self.items.clear();
        self.saved = None;
        self.share_url = None;
        self.script = None;

        self.status = AuthoringStatus::Extracting;
        info!("📖 正在读取 PDF: {}", file.name);
        let text = match extractor.extract(&file.name, file.bytes).await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(e)),
        };

        self.status = AuthoringStatus::Generating;
        match generator.generate(&text, self.question_count).await {
            Ok(items) => {
                self.items = items;
                self.status = AuthoringStatus::Ready;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// 修改第 `position` 题
    pub fn edit_item(&mut self, position: usize, item: QuizItem) -> Result<(), ValidationError> {
        self.require_editable("edit")?;
        let total = self.items.len();
        if position >= total {
            return Err(ValidationError::PositionOutOfRange { position, total });
        }
        if !item.is_valid() {
            return Err(ValidationError::AnswerNotInOptions { position });
        }
        self.items[position] = item;
        Ok(())
    }

    /// 删除第 `position` 题，至少保留一题
    pub fn remove_item(&mut self, position: usize) -> Result<QuizItem, ValidationError> {
        self.require_editable("remove")?;
        let total = self.items.len();
        if position >= total {
            return Err(ValidationError::PositionOutOfRange { position, total });
        }
        if total == 1 {
            return Err(ValidationError::EmptyQuiz);
        }
        Ok(self.items.remove(position))
    }

    /// 保存测验并生成分享链接
    pub async fn confirm(&mut self, repo: &QuizRepository, share_base_url: &str) -> AppResult<Quiz> {
        self.require_reviewable("confirm")?;
        if self.saved.is_some() {
            return Err(ValidationError::InvalidState { action: "confirm" }.into());
        }

        let new_quiz = NewQuiz::new(
            self.title.trim(),
            self.description.trim(),
            self.creator.trim(),
            self.items.clone(),
        );
        new_quiz.validate()?;

        let id = match repo.create_quiz(&new_quiz).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(e)),
        };

        let quiz = new_quiz.into_quiz(id);
        let url = share_url(share_base_url, &quiz.id, false);
        info!("🔗 分享链接: {}", url);
        self.share_url = Some(url);
        self.saved = Some(quiz.clone());
        Ok(quiz)
    }

    /// 生成 Google 表单脚本
    ///
    /// 已保存时以保存的测验为准，保证表单与分享链接的内容一致。
    pub fn generate_script(&mut self, folder_url: Option<&str>) -> Result<&str, ValidationError> {
        self.require_reviewable("export")?;
        let folder = folder_url.map(str::trim).filter(|url| !url.is_empty());
        let script = match &self.saved {
            Some(quiz) => export_form_script(&quiz.items, &quiz.title, &quiz.description, folder),
            None => export_form_script(&self.items, &self.title, &self.description, folder),
        };
        self.status = AuthoringStatus::Done;
        Ok(self.script.insert(script).as_str())
    }

    /// 回到初始状态
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn require_reviewable(&self, action: &'static str) -> Result<(), ValidationError> {
        if self.status.is_reviewable() {
            Ok(())
        } else {
            warn!("当前状态 {:?} 不允许 {}", self.status, action);
            Err(ValidationError::InvalidState { action })
        }
    }

    /// 保存后的测验不可修改
    fn require_editable(&self, action: &'static str) -> Result<(), ValidationError> {
        self.require_reviewable(action)?;
        if self.saved.is_some() {
            warn!("测验已保存，不允许 {}", action);
            return Err(ValidationError::InvalidState { action });
        }
        Ok(())
    }

    fn fail(&mut self, err: AppError) -> AppError {
        error!("❌ 测验制作失败: {}", err);
        self.status = AuthoringStatus::Error(err.user_message());
        err
    }
}

/// 拼接测验链接
pub fn share_url(base_url: &str, quiz_id: &str, preview: bool) -> String {
    if preview {
        format!("{}#/quiz/{}?preview=true", base_url, quiz_id)
    } else {
        format!("{}#/quiz/{}", base_url, quiz_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryStore;
    use crate::services::CompletionBackend;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedBackend;

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        fn model(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _s: &str, _u: &str, _t: f32) -> AppResult<String> {
            Ok(r#"[{"question":"Q","options":["A","B","C","D"],"answer":"C"}]"#.to_string())
        }
    }

    /// 生成只有一页文本的 PDF
    fn pdf_with_text(text: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn ready_flow() -> AuthoringFlow {
        let mut flow = AuthoringFlow::new();
        flow.select_file("研修.pdf", Vec::new());
        flow.items = vec![
            QuizItem::new("Q1", ["A", "B"], "A"),
            QuizItem::new("Q2", ["A", "B"], "B"),
        ];
        flow.status = AuthoringStatus::Ready;
        flow
    }

    #[test]
    fn test_select_file_defaults() {
        let mut flow = AuthoringFlow::new();
        flow.select_file("研修.pdf", vec![1, 2, 3]);
        assert_eq!(flow.title(), "基于「研修.pdf」的测验");
        assert!(flow.description().contains("研修.pdf"));

        flow.set_title("自定义标题");
        flow.select_file("其他.pdf", Vec::new());
        assert_eq!(flow.title(), "自定义标题");
        assert_eq!(flow.file_name(), Some("其他.pdf"));
    }

    #[test]
    fn test_question_count_clamped() {
        let mut flow = AuthoringFlow::new();
        assert_eq!(flow.question_count(), 5);
        flow.set_question_count(0);
        assert_eq!(flow.question_count(), 1);
        flow.set_question_count(99);
        assert_eq!(flow.question_count(), 10);
    }

    #[tokio::test]
    async fn test_generation_requires_file() {
        let mut flow = AuthoringFlow::new();
        let generator = QuizGenerator::new(Arc::new(FixedBackend));
        let err = flow
            .start_generation(&PdfExtractor::new(), &generator)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(flow.status(), &AuthoringStatus::Idle);
    }

    #[tokio::test]
    async fn test_unreadable_pdf_sets_error() {
        let mut flow = AuthoringFlow::new();
        flow.select_file("broken.pdf", b"not a pdf".to_vec());
        let generator = QuizGenerator::new(Arc::new(FixedBackend));

        assert!(flow
            .start_generation(&PdfExtractor::new(), &generator)
            .await
            .is_err());
        assert!(matches!(flow.status(), AuthoringStatus::Error(_)));

        flow.reset();
        assert_eq!(flow.status(), &AuthoringStatus::Idle);
        assert!(flow.file_name().is_none());
    }

    #[tokio::test]
    async fn test_generation_reaches_ready() {
        let text = "Expense reports must be submitted with receipts before the monthly closing date. "
            .repeat(3);
        let mut flow = AuthoringFlow::new();
        flow.select_file("expense-policy.pdf", pdf_with_text(&text));
        flow.set_question_count(3);
        let generator = QuizGenerator::new(Arc::new(FixedBackend));

        flow.start_generation(&PdfExtractor::new(), &generator)
            .await
            .unwrap();
        assert_eq!(flow.status(), &AuthoringStatus::Ready);
        assert_eq!(flow.items().len(), 1);
        assert_eq!(flow.items()[0].answer, "C");
    }

    #[tokio::test]
    async fn test_short_pdf_text_sets_error() {
        let mut flow = AuthoringFlow::new();
        flow.select_file("cover.pdf", pdf_with_text("Cover page"));
        let generator = QuizGenerator::new(Arc::new(FixedBackend));

        let err = flow
            .start_generation(&PdfExtractor::new(), &generator)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(crate::error::ExtractionError::InsufficientText { .. })
        ));
        assert!(matches!(flow.status(), AuthoringStatus::Error(_)));
        assert!(flow.items().is_empty());
    }

    #[test]
    fn test_edit_and_remove() {
        let mut flow = ready_flow();
        assert_eq!(
            flow.edit_item(0, QuizItem::new("Q1", ["A", "B"], "X")),
            Err(ValidationError::AnswerNotInOptions { position: 0 })
        );
        flow.edit_item(0, QuizItem::new("新Q1", ["A", "B"], "B"))
            .unwrap();
        assert_eq!(flow.items()[0].question, "新Q1");

        flow.remove_item(1).unwrap();
        assert_eq!(flow.remove_item(0), Err(ValidationError::EmptyQuiz));
        assert_eq!(
            flow.remove_item(5),
            Err(ValidationError::PositionOutOfRange {
                position: 5,
                total: 1
            })
        );
    }

    #[tokio::test]
    async fn test_confirm_and_export() {
        let repo = QuizRepository::with_store(Arc::new(MemoryStore::new()));
        let mut flow = ready_flow();
        flow.set_creator("山田 太郎");

        let quiz = flow.confirm(&repo, "http://localhost:5173/").await.unwrap();
        assert_eq!(
            flow.share_url(),
            Some(format!("http://localhost:5173/#/quiz/{}", quiz.id).as_str())
        );
        assert_eq!(quiz.creator, "山田 太郎");
        // 重复保存会产生重复的测验
        assert!(flow.confirm(&repo, "http://x/").await.is_err());

        let script = flow.generate_script(Some("  ")).unwrap().to_string();
        assert!(script.contains(r#"const targetFolderUrl = "";"#));
        assert_eq!(flow.status(), &AuthoringStatus::Done);
        assert_eq!(repo.list_quizzes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_saved_quiz_is_frozen() {
        let repo = QuizRepository::with_store(Arc::new(MemoryStore::new()));
        let mut flow = ready_flow();
        flow.confirm(&repo, "http://localhost:5173/").await.unwrap();

        assert_eq!(
            flow.edit_item(0, QuizItem::new("EDITED", ["A", "B"], "A")),
            Err(ValidationError::InvalidState { action: "edit" })
        );
        assert_eq!(
            flow.remove_item(1),
            Err(ValidationError::InvalidState { action: "remove" })
        );
        flow.set_title("改过的标题");

        let script = flow.generate_script(None).unwrap().to_string();
        assert!(!script.contains("EDITED"));
        assert!(!script.contains("改过的标题"));
        assert!(script.contains(r#""question": "Q1""#));

        let stored = repo.list_quizzes().await.unwrap();
        assert_eq!(stored[0].items, flow.items());
    }

    #[test]
    fn test_export_requires_items() {
        let mut flow = AuthoringFlow::new();
        assert_eq!(
            flow.generate_script(None).unwrap_err(),
            ValidationError::InvalidState { action: "export" }
        );
    }
}
