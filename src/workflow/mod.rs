//! 流程层（Workflow Layer）
//!
//! 每个画面对应一个状态机，只依赖 services 提供的能力，不持有远程资源。
//!
//! - `quiz_session`: 答题（作答 → 提交 → 重试，预览只读）
//! - `authoring`: 测验制作（上传 → 抽取 → 生成 → 审阅 → 保存 / 导出）
//! - `dashboard`: 管理菜单的表格行与删除权限
//! - `feedback`: 反馈草稿与提交

pub mod authoring;
pub mod dashboard;
pub mod feedback;
pub mod quiz_session;

pub use authoring::{share_url, AuthoringFlow, AuthoringStatus};
pub use dashboard::{dashboard_rows, DashboardRow};
pub use feedback::FeedbackDraft;
pub use quiz_session::{OptionMark, QuizSession, SessionMode};
