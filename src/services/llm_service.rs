//! LLM 服务 - 业务能力层
//!
//! 只负责"发一条消息，拿回一段文本"，不关心测验格式。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Gemini 的 OpenAI 兼容端点）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, GenerationError};

/// 文本补全后端
///
/// 生成网关只依赖这个 trait，测试中可以替换为脚本化的实现。
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 模型名称（用于日志和错误信息）
    fn model(&self) -> &str;

    /// 发送一次请求，返回去除首尾空白的文本
    async fn complete(
        &self,
        system_message: &str,
        user_message: &str,
        temperature: f32,
    ) -> AppResult<String>;
}

/// 基于 async-openai 的后端
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_tokens: 8192,
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmService {
    fn model(&self) -> &str {
        &self.model_name
    }

    async fn complete(
        &self,
        system_message: &str,
        user_message: &str,
        temperature: f32,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let build_err = |e| AppError::generation_failed(&self.model_name, e);

        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_message)
            .build()
            .map_err(build_err)?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(build_err)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system),
                ChatCompletionRequestMessage::User(user),
            ])
            .temperature(temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(build_err)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::generation_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(GenerationError::EmptyContent {
                model: self.model_name.clone(),
            }
            .into());
        }

        Ok(content)
    }
}
