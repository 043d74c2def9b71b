//! # Quiz Studio
//!
//! 根据上传的 PDF 自动生成选择题测验的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有远程资源（HTTP 客户端），只暴露能力
//! - `DocumentStore` - 文档存储能力（Firestore REST / 进程内存储）
//! - `IdentityClient` - 根据 ID Token 查询登录用户
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只做一件事
//! - `QuizRepository` - 测验和反馈的持久化
//! - `QuizGenerator` - AI 出题能力（基于 `LlmService`）
//! - `PdfExtractor` - PDF 文本抽取
//! - `export_form_script` - 生成 Google 表单脚本
//! - `AccessGate` - 邮箱域名白名单
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 每个画面一个状态机
//! - `QuizSession` - 作答 → 提交 → 重试
//! - `AuthoringFlow` - 上传 → 抽取 → 生成 → 审阅 → 保存 / 导出
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 持有网关和应用状态，根据路由决定画面
//! - `orchestrator/route` - `#/...` 路由解析
//!
//! ### ⑤ 界面层（UI）
//! - `ui/` - 把画面渲染成终端文本
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod ui;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Quiz, QuizItem};
pub use orchestrator::{App, Route, View};
pub use workflow::{AuthoringFlow, QuizSession};
