//! Firestore REST 客户端
//!
//! 使用 Firebase ID Token 作为 Bearer 凭据访问 `(default)` 数据库，
//! 权限由 Firestore 安全规则决定。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, PersistenceError};
use crate::infrastructure::document_store::{DocumentStore, JsonMap, OrderBy, StoredDocument};
use crate::infrastructure::firestore_value::{decode_fields, encode_fields};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

/// Firestore 文档存储
pub struct FirestoreStore {
    http: Client,
    base_url: String,
    project_id: String,
    id_token: Option<String>,
}

impl FirestoreStore {
    /// 创建新的 Firestore 客户端
    pub fn new(
        project_id: impl Into<String>,
        id_token: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::request_failed("reqwest::Client", e))?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            id_token,
        })
    }

    /// 使用自定义端点（例如本地模拟器）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    fn documents_url(&self) -> String {
        format!("{}/{}/documents", self.base_url, self.database_path())
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_path(), collection, id)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.id_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// 发送请求并检查状态码
    async fn execute(&self, endpoint: &str, builder: RequestBuilder) -> AppResult<Response> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!("Firestore 返回错误 ({}): {} {}", endpoint, status, message);
        Err(PersistenceError::BadResponse {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        }
        .into())
    }

    async fn execute_json(&self, endpoint: &str, builder: RequestBuilder) -> AppResult<JsonValue> {
        let response = self.execute(endpoint, builder).await?;
        response
            .json::<JsonValue>()
            .await
            .map_err(|e| AppError::request_failed(endpoint, e))
    }

    async fn commit(&self, writes: Vec<JsonValue>) -> AppResult<JsonValue> {
        let url = format!("{}:commit", self.documents_url());
        let body = json!({ "writes": writes });
        self.execute_json("documents:commit", self.http.post(url).json(&body))
            .await
    }

    async fn list_all(&self, collection: &str) -> AppResult<Vec<StoredDocument>> {
        let url = format!("{}/{}", self.documents_url(), collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let page = self
                .execute_json(collection, self.http.get(&url).query(&query))
                .await?;

            if let Some(docs) = page.get("documents").and_then(|v| v.as_array()) {
                for doc in docs {
                    documents.push(parse_document(doc)?);
                }
            }

            page_token = page
                .get("nextPageToken")
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }

        Ok(documents)
    }

    async fn run_ordered_query(
        &self,
        collection: &str,
        order: &OrderBy,
    ) -> AppResult<Vec<StoredDocument>> {
        let url = format!("{}:runQuery", self.documents_url());
        let direction = if order.descending {
            "DESCENDING"
        } else {
            "ASCENDING"
        };
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "orderBy": [{
                    "field": { "fieldPath": order.field },
                    "direction": direction
                }]
            }
        });

        let rows = self
            .execute_json("documents:runQuery", self.http.post(url).json(&body))
            .await?;

        // 每一行可能只有 readTime 没有 document
        rows.as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("document"))
                    .map(parse_document)
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn create(
        &self,
        collection: &str,
        fields: JsonMap,
        server_timestamps: &[&str],
    ) -> AppResult<String> {
        let encoded = encode_fields(&fields);

        if server_timestamps.is_empty() {
            let url = format!("{}/{}", self.documents_url(), collection);
            let doc = self
                .execute_json(collection, self.http.post(url).json(&json!({ "fields": encoded })))
                .await?;
            let stored = parse_document(&doc)?;
            debug!("Firestore 新建文档: {}/{}", collection, stored.id);
            return Ok(stored.id);
        }

        // 需要服务端时间戳时只能走 commit，ID 由客户端生成
        let id = uuid::Uuid::new_v4().simple().to_string();
        let transforms: Vec<JsonValue> = server_timestamps
            .iter()
            .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
            .collect();
        let write = json!({
            "update": {
                "name": self.document_name(collection, &id),
                "fields": encoded
            },
            "updateTransforms": transforms,
            "currentDocument": { "exists": false }
        });
        self.commit(vec![write]).await?;
        debug!("Firestore 新建文档 (含服务端时间戳): {}/{}", collection, id);
        Ok(id)
    }

    async fn list(&self, collection: &str, order: Option<&OrderBy>) -> AppResult<Vec<StoredDocument>> {
        match order {
            Some(order) => self.run_ordered_query(collection, order).await,
            None => self.list_all(collection).await,
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let url = format!("{}/{}/{}", self.documents_url(), collection, id);
        self.execute(collection, self.http.delete(url)).await?;
        Ok(())
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> AppResult<()> {
        let write = json!({
            "transform": {
                "document": self.document_name(collection, id),
                "fieldTransforms": [{
                    "fieldPath": field,
                    "increment": { "integerValue": by.to_string() }
                }]
            },
            "currentDocument": { "exists": true }
        });

        match self.commit(vec![write]).await {
            Ok(_) => Ok(()),
            Err(AppError::Persistence(PersistenceError::BadResponse { status: 404, .. })) => {
                Err(PersistenceError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }
}

/// 解析 REST 返回的文档对象，ID 取自 `name` 的最后一段
fn parse_document(doc: &JsonValue) -> AppResult<StoredDocument> {
    let name = doc
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PersistenceError::DecodeFailed {
            source: "文档缺少 name 字段".into(),
        })?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();

    let data = match doc.get("fields").and_then(|v| v.as_object()) {
        Some(fields) => decode_fields(fields)?,
        None => JsonMap::new(),
    };

    Ok(StoredDocument { id, data })
}
