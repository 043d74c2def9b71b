use serde::{Deserialize, Serialize};

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "localId")]
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(
        uid: impl Into<String>,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    /// 显示名称，没有时退回到邮箱
    pub fn name_or_email(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("")
    }
}
