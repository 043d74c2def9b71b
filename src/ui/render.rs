use std::fmt::Write;

use crate::models::FeedbackReport;
use crate::orchestrator::View;
use crate::workflow::{AuthoringFlow, AuthoringStatus, OptionMark, QuizSession, SessionMode};

const RULE: &str = "────────────────────────────────────────";

/// 渲染画面
pub fn render_view(view: &View) -> String {
    let mut out = String::new();
    match view {
        View::Loading => out.push_str("读取中..."),
        View::SignIn => out.push_str("请先登录（设置 QUIZ_ID_TOKEN 后重试）"),
        View::AccessDenied { domain } => {
            let _ = write!(
                out,
                "没有访问权限\n只有 @{} 域名的账号可以使用本应用。",
                domain
            );
        }
        View::Create => out.push_str("测验制作\n上传 PDF，AI 会根据内容自动生成测验。"),
        View::Dashboard(rows) => {
            let _ = writeln!(out, "管理菜单（共 {} 个测验）", rows.len());
            out.push_str(RULE);
            for row in rows {
                let _ = write!(
                    out,
                    "\n{:>3}. {}\n     创建者: {}  创建时间: {}  回答数: {}\n     链接: {}",
                    row.number, row.title, row.creator, row.created_at, row.responses, row.share_url
                );
                if row.can_manage {
                    let _ = write!(out, "\n     预览: {}  [可删除: {}]", row.preview_url, row.id);
                }
            }
        }
        View::TakeQuiz { quiz, preview } => {
            let mode = if *preview { "（预览）" } else { "" };
            let _ = write!(out, "{}{}\n{}", quiz.title, mode, quiz.description);
        }
        View::FeedbackForm => out.push_str("反馈\n请填写功能需求或缺陷报告。"),
        View::FeedbackList => out.push_str("反馈列表"),
        View::NotFound => {
            out.push_str("Quiz Not Found\n测验不存在或已被删除。返回制作画面: #/")
        }
    }
    out
}

fn mark_symbol(mark: OptionMark) -> &'static str {
    match mark {
        OptionMark::Neutral => "[ ]",
        OptionMark::Selected => "[*]",
        OptionMark::Correct => "[✓]",
        OptionMark::Incorrect => "[✗]",
        OptionMark::Dimmed => "[·]",
    }
}

/// 渲染答题会话
pub fn render_session(session: &QuizSession) -> String {
    let quiz = session.quiz();
    let mut out = String::new();
    let _ = writeln!(out, "{}", quiz.title);
    if !quiz.description.is_empty() {
        let _ = writeln!(out, "{}", quiz.description);
    }
    if session.mode() == SessionMode::Preview {
        let _ = writeln!(out, "预览模式：正确答案已标出");
    }
    out.push_str(RULE);

    for (i, item) in quiz.items.iter().enumerate() {
        let _ = write!(out, "\nQ{}. {}", i + 1, item.question);
        for (j, option) in item.options.iter().enumerate() {
            let _ = write!(
                out,
                "\n  {} {}. {}",
                mark_symbol(session.option_mark(i, option)),
                j + 1,
                option
            );
        }
    }

    if let Some(score) = session.score() {
        let _ = write!(out, "\n{}\n得分: {} / {}", RULE, score, quiz.len());
        if session.is_perfect() {
            out.push_str("\n🎉 全部正确！");
        }
    }
    out
}

/// 渲染测验制作结果
pub fn render_authoring(flow: &AuthoringFlow) -> String {
    let mut out = String::new();
    match flow.status() {
        AuthoringStatus::Idle => out.push_str("请选择 PDF 文件"),
        AuthoringStatus::Extracting => out.push_str("正在读取 PDF..."),
        AuthoringStatus::Generating => out.push_str("AI 正在生成测验..."),
        AuthoringStatus::Error(message) => {
            let _ = write!(out, "错误: {}\n可以重新开始。", message);
        }
        AuthoringStatus::Ready | AuthoringStatus::Done => {
            let _ = writeln!(out, "{}", flow.title());
            let _ = writeln!(out, "{}", flow.description());
            out.push_str(RULE);
            for (i, item) in flow.items().iter().enumerate() {
                let _ = write!(out, "\nQ{}. {}", i + 1, item.question);
                for option in &item.options {
                    let marker = if item.is_correct(option) { "✓" } else { " " };
                    let _ = write!(out, "\n  {} {}", marker, option);
                }
            }
            if let Some(url) = flow.share_url() {
                let _ = write!(out, "\n{}\n分享链接: {}", RULE, url);
            }
        }
    }
    out
}

/// 渲染反馈列表
pub fn render_feedback_list(reports: &[FeedbackReport]) -> String {
    if reports.is_empty() {
        return "还没有反馈".to_string();
    }

    let mut out = String::new();
    for report in reports {
        let time = report
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let _ = write!(
            out,
            "\n[{}] {} {} <{}>\n  {}",
            report.kind.label(),
            time,
            report.reporter_name.as_deref().unwrap_or("匿名"),
            report.reporter_email.as_deref().unwrap_or("-"),
            report.content
        );
    }
    out.trim_start().to_string()
}
