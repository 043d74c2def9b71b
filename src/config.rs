use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 配置文件路径的环境变量名
pub const CONFIG_PATH_ENV: &str = "QUIZ_STUDIO_CONFIG";
/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "quiz_studio.toml";

/// 文档存储后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Firestore REST
    Firestore,
    /// 进程内存储（离线调试用）
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::EnvVarParseFailed {
                var_name: "STORE_BACKEND".to_string(),
                value: other.to_string(),
                expected_type: "firestore | memory".to_string(),
            }),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- Firebase 配置 ---
    pub firebase_project_id: String,
    pub firebase_api_key: String,
    /// 当前登录用户的 ID Token
    pub id_token: Option<String>,
    /// 允许访问的邮箱域名
    pub allowed_domain: String,
    /// 离线模式（memory 后端）下使用的本地用户
    pub local_user_name: Option<String>,
    pub local_user_email: Option<String>,
    // --- 存储配置 ---
    pub store_backend: StoreBackend,
    pub quiz_collection: String,
    pub feedback_collection: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 分享链接的前缀（不含 `#`）
    pub share_base_url: String,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    /// 启动时的路由
    pub start_hash: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firebase_project_id: String::new(),
            firebase_api_key: String::new(),
            id_token: None,
            allowed_domain: "tokium.jp".to_string(),
            local_user_name: None,
            local_user_email: None,
            store_backend: StoreBackend::Firestore,
            quiz_collection: "quizzes".to_string(),
            feedback_collection: "feedback".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
            share_base_url: "http://localhost:5173/".to_string(),
            request_timeout_secs: 60,
            start_hash: "#/".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 配置文件（可选）→ 环境变量
    pub fn load() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };

        base.overlay_env()
    }

    /// 从 TOML 文件读取配置，缺省字段使用默认值
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileParseFailed {
            path: path.to_string(),
            source: Box::new(e),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::FileParseFailed { source, .. } => ConfigError::FileParseFailed {
                path: path.to_string(),
                source,
            }
            .into(),
            other => other.into(),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::FileParseFailed {
            path: String::new(),
            source: Box::new(e),
        })
    }

    /// 用环境变量覆盖已有配置
    pub fn overlay_env(self) -> AppResult<Self> {
        let id_token = std::env::var("QUIZ_ID_TOKEN").ok().or(self.id_token);
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => self.store_backend,
        };

        Ok(Self {
            firebase_project_id: env_or("FIREBASE_PROJECT_ID", self.firebase_project_id),
            firebase_api_key: env_or("FIREBASE_API_KEY", self.firebase_api_key),
            id_token,
            allowed_domain: env_or("ALLOWED_DOMAIN", self.allowed_domain),
            local_user_name: std::env::var("LOCAL_USER_NAME").ok().or(self.local_user_name),
            local_user_email: std::env::var("LOCAL_USER_EMAIL").ok().or(self.local_user_email),
            store_backend,
            quiz_collection: env_or("QUIZ_COLLECTION", self.quiz_collection),
            feedback_collection: env_or("FEEDBACK_COLLECTION", self.feedback_collection),
            llm_api_key: env_or("LLM_API_KEY", self.llm_api_key),
            llm_api_base_url: env_or("LLM_API_BASE_URL", self.llm_api_base_url),
            llm_model_name: env_or("LLM_MODEL_NAME", self.llm_model_name),
            share_base_url: env_or("SHARE_BASE_URL", self.share_base_url),
            request_timeout_secs: env_parse_or("REQUEST_TIMEOUT_SECS", self.request_timeout_secs)?,
            start_hash: env_or("START_HASH", self.start_hash),
            verbose_logging: env_parse_or("VERBOSE_LOGGING", self.verbose_logging)?,
        })
    }

    /// 校验远程后端所需的配置是否齐全
    pub fn require_firestore(&self) -> Result<(), ConfigError> {
        if self.firebase_project_id.is_empty() {
            return Err(ConfigError::Missing {
                name: "firebase_project_id".to_string(),
            });
        }
        Ok(())
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            firebase_project_id = "quiz-prod"
            store_backend = "memory"
            request_timeout_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.firebase_project_id, "quiz-prod");
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.quiz_collection, "quizzes");
        assert_eq!(config.allowed_domain, "tokium.jp");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml_str("request_timeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" firestore ".parse::<StoreBackend>().unwrap(), StoreBackend::Firestore);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_require_firestore() {
        let config = Config::default();
        assert!(config.require_firestore().is_err());

        let config = Config {
            firebase_project_id: "p".to_string(),
            ..Config::default()
        };
        assert!(config.require_firestore().is_ok());
    }
}
