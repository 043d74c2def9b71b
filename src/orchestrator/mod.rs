//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层是整个系统的"指挥中心"：持有网关和应用状态，根据路由决定当前画面。
//!
//! ## 模块划分
//!
//! ### `route` - 路由
//! - 把 `#/...` 解析为 `Route`，纯函数
//!
//! ### `state` - 应用状态
//! - 当前路由、加载状态、已加载的测验集合
//!
//! ### `view` - 画面
//! - 登录状态 + 加载状态 + 路由 → `View`
//!
//! ### `app` - 应用
//! - 初始化（存储后端、登录状态）
//! - 把用户操作委托给 workflow 中的状态机
//!
//! ## 层次关系
//!
//! ```text
//! app (Route → View)
//!     ↓
//! workflow (QuizSession / AuthoringFlow / dashboard / FeedbackDraft)
//!     ↓
//! services (repository / generator / extractor / form_script / access_gate)
//!     ↓
//! infrastructure (DocumentStore / IdentityClient)
//! ```

pub mod app;
pub mod route;
pub mod state;
pub mod view;

// 重新导出主要类型
pub use app::App;
pub use route::Route;
pub use state::AppState;
pub use view::View;
