//! 文档存储能力
//!
//! 以"集合 + 文档 ID"为单位的最小接口，业务层只依赖这个 trait。

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{AppResult, PersistenceError};

pub type JsonMap = serde_json::Map<String, JsonValue>;

/// 排序条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }
}

/// 读取出来的文档
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: JsonMap,
}

impl StoredDocument {
    /// 反序列化为业务类型
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(JsonValue::Object(self.data.clone())).map_err(|e| {
            PersistenceError::DecodeFailed {
                source: Box::new(e),
            }
            .into()
        })
    }
}

/// 将业务类型序列化为文档字段
pub fn encode_fields<T: Serialize>(value: &T) -> AppResult<JsonMap> {
    match serde_json::to_value(value)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(PersistenceError::DecodeFailed {
            source: format!("文档必须是对象，实际为: {}", other).into(),
        }
        .into()),
    }
}

/// 文档存储
///
/// 所有操作都可能失败；调用方负责记录日志并提示用户，这里不做重试。
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 新建文档，返回分配的 ID
    ///
    /// `server_timestamps` 中的字段由服务端写入当前时间。
    async fn create(
        &self,
        collection: &str,
        fields: JsonMap,
        server_timestamps: &[&str],
    ) -> AppResult<String>;

    /// 读取集合中的全部文档
    async fn list(&self, collection: &str, order: Option<&OrderBy>) -> AppResult<Vec<StoredDocument>>;

    /// 删除文档
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;

    /// 对数值字段做原子自增，字段不存在时视为 0
    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> AppResult<()>;
}
