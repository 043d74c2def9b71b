use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
///
/// 按错误来源分为五类业务错误，外加配置错误。
/// 所有错误都在发起外部调用的边界处被捕获，不会以 panic 的形式向上传播。
#[derive(Debug, Error)]
pub enum AppError {
    /// PDF 文本抽取错误
    #[error("文本抽取错误: {0}")]
    Extraction(#[from] ExtractionError),
    /// AI 生成错误
    #[error("AI生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 持久化错误
    #[error("持久化错误: {0}")]
    Persistence(#[from] PersistenceError),
    /// 校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 权限错误
    #[error("权限错误: {0}")]
    Authorization(#[from] AuthorizationError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// PDF 文本抽取错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// PDF 无法加载
    #[error("无法读取PDF文件 ({name}): {source}")]
    LoadFailed { name: String, source: BoxedSource },
    /// 抽取出的文本过短
    #[error("PDF中未能抽取到足够的文本 ({chars} 字符，至少需要 {required} 字符)，请使用文本型PDF")]
    InsufficientText { chars: usize, required: usize },
}

/// AI 生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 远程调用失败
    #[error("AI接口调用失败 (模型: {model}): {source}")]
    ApiCallFailed { model: String, source: BoxedSource },
    /// 返回内容为空
    #[error("AI返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 返回内容无法解析
    #[error("无法解析AI返回的题目 (响应: {response}): {source}")]
    ParseFailed { response: String, source: BoxedSource },
    /// 解析后没有可用的题目
    #[error("AI未能生成有效的测验题目")]
    NoValidItems,
}

/// 持久化错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed { endpoint: String, source: BoxedSource },
    /// 远端返回错误状态
    #[error("远端返回错误 ({endpoint}): status={status}, message={message}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 文档不存在
    #[error("文档不存在: {collection}/{id}")]
    NotFound { collection: String, id: String },
    /// 文档内容无法解析
    #[error("文档解析失败: {source}")]
    DecodeFailed { source: BoxedSource },
}

/// 校验错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// 未回答全部题目
    #[error("请回答所有题目 (已回答 {answered}/{total})")]
    Incomplete { answered: usize, total: usize },
    /// 重复提交
    #[error("已经提交过，请先点击重试")]
    AlreadySubmitted,
    /// 预览模式不接受提交
    #[error("预览模式下不能提交答案")]
    PreviewReadOnly,
    /// 缺少必填项
    #[error("缺少必填项: {field}")]
    MissingField { field: &'static str },
    /// 题目的正确答案不在选项中
    #[error("第 {position} 题的正确答案不在选项中")]
    AnswerNotInOptions { position: usize },
    /// 测验中没有题目
    #[error("测验至少需要一道题目")]
    EmptyQuiz,
    /// 题目位置越界
    #[error("题目位置 {position} 超出范围 (共 {total} 题)")]
    PositionOutOfRange { position: usize, total: usize },
    /// 当前状态不允许该操作
    #[error("当前状态不允许此操作: {action}")]
    InvalidState { action: &'static str },
}

/// 权限错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    /// 未登录
    #[error("需要登录")]
    NotSignedIn,
    /// 邮箱域名不在白名单中
    #[error("只有 @{domain} 域名的账号可以使用本应用")]
    DomainNotAllowed { domain: String },
    /// 不是测验的创建者
    #[error("只有创建者可以删除该测验")]
    NotCreator,
    /// 无法验证登录状态
    #[error("无法验证登录状态: {0}")]
    LookupFailed(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 缺少必需的配置
    #[error("缺少必需的配置项: {name}")]
    Missing { name: String },
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    FileParseFailed { path: String, source: BoxedSource },
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        AppError::Persistence(PersistenceError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Persistence(PersistenceError::DecodeFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Extraction(ExtractionError::LoadFailed {
            name: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建请求失败错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence(PersistenceError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建 AI 调用失败错误
    pub fn generation_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Generation(GenerationError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 是否为校验错误（校验错误不改变任何状态）
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// 面向用户展示的错误文本
    pub fn user_message(&self) -> String {
        match self {
            AppError::Extraction(e) => e.to_string(),
            AppError::Generation(GenerationError::ApiCallFailed { .. }) => {
                "AI生成测验时发生错误，请稍后重试。".to_string()
            }
            AppError::Generation(e) => e.to_string(),
            AppError::Persistence(_) => "与数据库通信失败，请稍后重试。".to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::Authorization(e) => e.to_string(),
            AppError::Config(e) => e.to_string(),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_detection() {
        let err = AppError::from(ValidationError::EmptyQuiz);
        assert!(err.is_validation());

        let err = AppError::from(GenerationError::NoValidItems);
        assert!(!err.is_validation());
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = AppError::from(PersistenceError::BadResponse {
            endpoint: "/v1/projects/p/databases/(default)/documents/quizzes".to_string(),
            status: 503,
            message: "backend unavailable".to_string(),
        });
        let msg = err.user_message();
        assert!(!msg.contains("503"));
        assert!(!msg.contains("documents"));
    }

    #[test]
    fn test_incomplete_message() {
        let err = ValidationError::Incomplete {
            answered: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "请回答所有题目 (已回答 1/3)");
    }
}
