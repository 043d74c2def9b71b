/// Firebase 身份服务客户端
///
/// 通过 `accounts:lookup` 把 ID Token 换成用户信息
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, AuthorizationError};
use crate::models::Identity;

const LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<Identity>,
}

pub struct IdentityClient {
    http: Client,
    api_key: String,
    lookup_url: String,
}

impl IdentityClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::request_failed("reqwest::Client", e))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            lookup_url: LOOKUP_URL.to_string(),
        })
    }

    /// 查询 ID Token 对应的用户
    pub async fn lookup(&self, id_token: &str) -> AppResult<Identity> {
        debug!("查询登录用户信息");

        let response = self
            .http
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "idToken": id_token }))
            .send()
            .await
            .map_err(|e| AuthorizationError::LookupFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("身份查询失败: {} {}", status, body);
            return Err(AuthorizationError::LookupFailed(format!("status={}", status)).into());
        }

        let parsed: LookupResponse = response
            .json()
            .await
            .map_err(|e| AuthorizationError::LookupFailed(e.to_string()))?;

        parsed
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AuthorizationError::NotSignedIn.into())
    }
}
