//! AI 生成网关 - 业务能力层
//!
//! 输入 PDF 抽取出的文本和题目数量，输出一组选择题。
//! 所有失败（文本过短、调用失败、空响应、无法解析）都作为错误返回，不做重试。

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppResult, ExtractionError, GenerationError};
use crate::models::QuizItem;
use crate::services::llm_service::CompletionBackend;
use crate::utils::logging::truncate_text;

/// 可用于出题的最少字符数
pub const MIN_SOURCE_CHARS: usize = 100;
/// 发送给模型的最大字符数
pub const MAX_SOURCE_CHARS: usize = 20_000;
/// 每道题的选项数
pub const OPTIONS_PER_ITEM: usize = 4;

const TEMPERATURE: f32 = 0.5;

const RESPONSE_SCHEMA: &str = r#"{
  "type": "array",
  "items": {
    "type": "object",
    "properties": {
      "question": { "type": "string", "description": "题目文本" },
      "options": { "type": "array", "items": { "type": "string" }, "description": "4个选项" },
      "answer": { "type": "string", "description": "正确选项，必须与 options 中的某一项完全一致" }
    },
    "required": ["question", "options", "answer"]
  }
}"#;

const SYSTEM_MESSAGE: &str = "你是一位教育专家，擅长根据资料编写考查核心概念理解程度的选择题。\
                              你只输出符合给定 JSON Schema 的 JSON，不输出任何其他内容。";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratedPayload {
    List(Vec<GeneratedItem>),
    Wrapped { items: Vec<GeneratedItem> },
}

#[derive(Debug, Deserialize)]
struct GeneratedItem {
    question: String,
    options: Vec<String>,
    answer: String,
}

impl From<GeneratedItem> for QuizItem {
    fn from(raw: GeneratedItem) -> Self {
        QuizItem::new(
            raw.question.trim(),
            raw.options.iter().map(|o| o.trim().to_string()),
            raw.answer.trim(),
        )
    }
}

/// AI 生成网关
#[derive(Clone)]
pub struct QuizGenerator {
    backend: Arc<dyn CompletionBackend>,
}

impl QuizGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// 根据文本生成 `count` 道选择题
    ///
    /// 返回的题数与 `count` 不一致时只记录警告。
    pub async fn generate(&self, text: &str, count: usize) -> AppResult<Vec<QuizItem>> {
        let chars = text.trim().chars().count();
        if chars < MIN_SOURCE_CHARS {
            return Err(ExtractionError::InsufficientText {
                chars,
                required: MIN_SOURCE_CHARS,
            }
            .into());
        }

        info!("🤖 正在生成 {} 道题目 (模型: {})", count, self.backend.model());

        let prompt = build_prompt(text, count);
        let response = self
            .backend
            .complete(SYSTEM_MESSAGE, &prompt, TEMPERATURE)
            .await?;

        if response.trim().is_empty() {
            return Err(GenerationError::EmptyContent {
                model: self.backend.model().to_string(),
            }
            .into());
        }

        let items = parse_items(&response)?;
        if items.len() != count {
            warn!("请求 {} 道题，实际生成 {} 道", count, items.len());
        }

        info!("✓ 生成完成，共 {} 道题目", items.len());
        Ok(items)
    }
}

fn build_prompt(text: &str, count: usize) -> String {
    let source: String = text.chars().take(MAX_SOURCE_CHARS).collect();
    format!(
        r#"请根据下面的资料，编写 {count} 道用于检验重要概念理解程度的选择题。
- 每道题提供 {options} 个选项，并明确给出正确答案。
- "answer" 的值必须与 "options" 数组中的某一个字符串完全一致。
- 使用与资料相同的语言出题。
- 严格按照以下 JSON Schema 返回结果：
{schema}

--- 资料 ---
{source}
---"#,
        count = count,
        options = OPTIONS_PER_ITEM,
        schema = RESPONSE_SCHEMA,
        source = source,
    )
}

/// 解析模型返回的题目列表
///
/// 兼容代码块包裹和 `{"items": [...]}` 形式；答案不在选项中的题目会被丢弃。
fn parse_items(response: &str) -> AppResult<Vec<QuizItem>> {
    let body = strip_code_fence(response);

    let payload = serde_json::from_str::<GeneratedPayload>(body).or_else(|first_err| {
        // 模型有时会在 JSON 前后夹带说明文字，或把代码块写在同一行
        [body, response.trim()]
            .into_iter()
            .find_map(|candidate| {
                let start = candidate.find('[')?;
                let end = candidate.rfind(']')?;
                (start < end)
                    .then(|| serde_json::from_str::<GeneratedPayload>(&candidate[start..=end]).ok())
                    .flatten()
            })
            .ok_or(first_err)
    });

    let raw_items = match payload {
        Ok(GeneratedPayload::List(items)) | Ok(GeneratedPayload::Wrapped { items }) => items,
        Err(e) => {
            return Err(GenerationError::ParseFailed {
                response: truncate_text(response, 200),
                source: Box::new(e),
            }
            .into())
        }
    };

    let total = raw_items.len();
    let items: Vec<QuizItem> = raw_items
        .into_iter()
        .map(QuizItem::from)
        .enumerate()
        .filter_map(|(i, item)| {
            if item.is_valid() && !item.question.is_empty() {
                Some(item)
            } else {
                warn!("丢弃第 {} 题: 答案不在选项中或题目为空", i + 1);
                None
            }
        })
        .collect();

    debug!("解析出 {}/{} 道有效题目", items.len(), total);

    if items.is_empty() {
        return Err(GenerationError::NoValidItems.into());
    }
    Ok(items)
}

fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 去掉语言标记所在的第一行
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
