use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 反馈类型
///
/// 存储时使用前端一直沿用的字面量。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FeedbackKind {
    /// 功能需求
    #[default]
    #[serde(rename = "機能要望")]
    FeatureRequest,
    /// 缺陷报告
    #[serde(rename = "バグ")]
    Bug,
}

impl FeedbackKind {
    /// 显示名称
    pub fn label(self) -> &'static str {
        match self {
            FeedbackKind::FeatureRequest => "功能需求",
            FeedbackKind::Bug => "缺陷",
        }
    }

    /// 从命令行参数或存储字面量解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "bug" | "バグ" => Some(FeedbackKind::Bug),
            "feature" | "feature-request" | "機能要望" => Some(FeedbackKind::FeatureRequest),
            _ => None,
        }
    }
}

/// 已保存的反馈（只追加，不修改）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub reporter_name: Option<String>,
    #[serde(default)]
    pub reporter_email: Option<String>,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub content: String,
    /// 服务端时间戳，写入后才有值
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
}

/// 待提交的反馈
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub reporter_name: Option<String>,
    pub reporter_email: Option<String>,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub content: String,
    pub status: &'static str,
}

impl NewFeedback {
    pub const STATUS_NEW: &'static str = "new";

    pub fn new(
        reporter_name: Option<String>,
        reporter_email: Option<String>,
        kind: FeedbackKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            reporter_name,
            reporter_email,
            kind,
            content: content.into(),
            status: Self::STATUS_NEW,
        }
    }
}
