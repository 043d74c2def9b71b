/// 日志工具模块
///
/// 提供日志初始化和常用的格式化输出
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose_logging` 选择默认级别。
/// 重复调用时静默忽略（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "quiz_studio=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 测验制作工具启动");
    info!("🗄️ 存储后端: {:?}", config.store_backend);
    info!("🤖 模型: {}", config.llm_model_name);
    info!("🔐 允许的域名: @{}", config.allowed_domain);
    info!("{}", "=".repeat(60));
}

/// 记录测验加载信息
pub fn log_quizzes_loaded(total: usize) {
    info!("✓ 已加载 {} 个测验", total);
}

/// 记录作答结果
pub fn log_session_result(quiz_id: &str, score: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📊 测验 {} 作答完成: {}/{}", quiz_id, score, total);
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
