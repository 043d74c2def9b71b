//! 文本界面
//!
//! 把画面和各个状态机渲染成终端中显示的文本，不做任何 I/O。

pub mod render;

pub use render::{render_authoring, render_feedback_list, render_session, render_view};
