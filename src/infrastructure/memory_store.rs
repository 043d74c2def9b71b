//! 进程内文档存储
//!
//! 行为与 Firestore 保持一致：删除不存在的文档不报错，自增不存在的文档报 NotFound，
//! 服务端时间戳写成 RFC 3339 字符串。

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value as JsonValue};

use crate::error::{AppResult, PersistenceError};
use crate::infrastructure::document_store::{DocumentStore, JsonMap, OrderBy, StoredDocument};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, BTreeMap<String, JsonMap>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// 严格递增的时间戳，保证同一进程内的排序稳定
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以指定 ID 写入文档（覆盖已有内容）
    pub fn insert(&self, collection: &str, id: &str, fields: JsonMap) {
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// 读取单个文档
    pub fn get(&self, collection: &str, id: &str) -> Option<JsonMap> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // 持锁期间不会 panic，中毒时直接沿用内部数据
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(
        &self,
        collection: &str,
        mut fields: JsonMap,
        server_timestamps: &[&str],
    ) -> AppResult<String> {
        let mut inner = self.lock();
        if !server_timestamps.is_empty() {
            let ts = inner
                .next_timestamp()
                .to_rfc3339_opts(SecondsFormat::Micros, true);
            for field in server_timestamps {
                fields.insert(field.to_string(), json!(ts));
            }
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn list(&self, collection: &str, order: Option<&OrderBy>) -> AppResult<Vec<StoredDocument>> {
        let inner = self.lock();
        let mut documents: Vec<StoredDocument> = inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| StoredDocument {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            documents.sort_by(|a, b| {
                match (a.data.get(&order.field), b.data.get(&order.field)) {
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (x, y) if order.descending => compare_field(x, y).reverse(),
                    (x, y) => compare_field(x, y),
                }
            });
        }

        Ok(documents)
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        if let Some(docs) = self.lock().collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> AppResult<()> {
        let mut inner = self.lock();
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| PersistenceError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let current = doc.get(field).and_then(|v| v.as_i64()).unwrap_or(0);
        doc.insert(field.to_string(), json!(current + by));
        Ok(())
    }
}

/// 比较两个字段值，类型不同时视为相等
///
/// 缺失字段的文档由调用方处理，无论升序还是降序都排在最后。
fn compare_field(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn fields(value: JsonValue) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let store = MemoryStore::new();
        let id = store
            .create("quizzes", fields(json!({"title": "a"})), &[])
            .await
            .unwrap();

        let docs = store.list("quizzes", None).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert!(store.list("feedback", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_timestamps_are_ordered() {
        let store = MemoryStore::new();
        let first = store
            .create("feedback", fields(json!({"n": 1})), &["createdAt"])
            .await
            .unwrap();
        let second = store
            .create("feedback", fields(json!({"n": 2})), &["createdAt"])
            .await
            .unwrap();

        let docs = store
            .list("feedback", Some(&OrderBy::desc("createdAt")))
            .await
            .unwrap();
        assert_eq!(docs[0].id, second);
        assert_eq!(docs[1].id, first);
    }

    #[tokio::test]
    async fn test_missing_field_sorts_last() {
        let store = MemoryStore::new();
        store.insert("feedback", "late", fields(json!({"createdAt": "2024-06-01T00:00:00Z"})));
        store.insert("feedback", "none", fields(json!({"content": "无时间"})));
        store.insert("feedback", "early", fields(json!({"createdAt": "2024-01-01T00:00:00Z"})));

        let asc = store
            .list("feedback", Some(&OrderBy::asc("createdAt")))
            .await
            .unwrap();
        let ids: Vec<_> = asc.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["early", "late", "none"]);

        let desc = store
            .list("feedback", Some(&OrderBy::desc("createdAt")))
            .await
            .unwrap();
        let ids: Vec<_> = desc.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["late", "early", "none"]);
    }

    #[tokio::test]
    async fn test_increment() {
        let store = MemoryStore::new();
        store.insert("quizzes", "q1", fields(json!({"title": "a"})));

        assert_ok!(store.increment("quizzes", "q1", "responseCount", 1).await);
        assert_ok!(store.increment("quizzes", "q1", "responseCount", 1).await);
        assert_eq!(store.get("quizzes", "q1").unwrap()["responseCount"], 2);

        assert_err!(store.increment("quizzes", "missing", "responseCount", 1).await);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryStore::new();
        assert_ok!(store.delete("quizzes", "nope").await);
    }
}
