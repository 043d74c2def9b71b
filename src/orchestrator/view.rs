//! 画面
//!
//! `App::view()` 的结果，由 ui 层渲染。

use crate::models::Quiz;
use crate::workflow::DashboardRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// 等待登录状态或测验加载
    Loading,
    SignIn,
    AccessDenied { domain: String },
    Create,
    Dashboard(Vec<DashboardRow>),
    TakeQuiz { quiz: Quiz, preview: bool },
    FeedbackForm,
    FeedbackList,
    NotFound,
}

impl View {
    /// 画面名称，用于日志
    pub fn name(&self) -> &'static str {
        match self {
            View::Loading => "loading",
            View::SignIn => "sign-in",
            View::AccessDenied { .. } => "access-denied",
            View::Create => "create",
            View::Dashboard(_) => "dashboard",
            View::TakeQuiz { .. } => "take-quiz",
            View::FeedbackForm => "feedback-form",
            View::FeedbackList => "feedback-list",
            View::NotFound => "not-found",
        }
    }
}
