use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use quiz_studio::config::Config;
use quiz_studio::models::{FeedbackKind, Quiz};
use quiz_studio::orchestrator::{App, Route, View};
use quiz_studio::services::{export_form_script, pdf_extractor};
use quiz_studio::ui;
use quiz_studio::utils::logging;
use quiz_studio::workflow::{AuthoringFlow, FeedbackDraft, QuizSession};

#[derive(Parser)]
#[command(author, version, about = "📝 根据 PDF 自动生成测验", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    QUIZ_STUDIO_CONFIG   配置文件路径 (默认 quiz_studio.toml)
    QUIZ_ID_TOKEN        Firebase 登录后的 ID Token
    STORE_BACKEND        firestore | memory
    LLM_API_KEY          生成测验使用的 API Key")]
struct Cli {
    /// 显示详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 显示某个路由对应的画面
    Route {
        /// 例如 "#/admin"、"#/quiz/<id>"
        #[arg(default_value = "#/")]
        hash: String,
    },
    /// 上传 PDF 并生成测验
    Create {
        #[arg(long)]
        pdf: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        creator: Option<String>,
        /// 题目数量 (1-10)
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        /// 只生成不保存
        #[arg(long)]
        dry_run: bool,
        /// 同时导出 Google 表单脚本到该文件
        #[arg(long)]
        script: Option<PathBuf>,
        /// 保存表单的 Drive 文件夹 URL
        #[arg(long)]
        folder: Option<String>,
    },
    /// 回答测验
    Take {
        id: String,
        /// 只读预览（显示正确答案）
        #[arg(long)]
        preview: bool,
        /// 逗号分隔的答案（选项序号或选项文本），省略时从标准输入逐行读取
        #[arg(long)]
        answers: Option<String>,
    },
    /// 删除测验（仅限创建者）
    Delete { id: String },
    /// 提交反馈
    Feedback {
        /// bug | feature
        #[arg(long, default_value = "feature")]
        kind: String,
        content: String,
    },
    /// 查看反馈列表
    FeedbackList,
    /// 为已保存的测验导出 Google 表单脚本
    Export {
        id: String,
        #[arg(long)]
        folder: Option<String>,
        /// 输出文件，省略时输出到标准输出
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load()?;
    logging::init(cli.verbose || config.verbose_logging);
    logging::log_startup(&config);

    // 初始化应用
    let mut app = App::initialize(config).await?;

    if let Err(e) = run(&mut app, cli.command).await {
        error!("❌ {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(app: &mut App, command: Command) -> Result<()> {
    let view = app.view();
    if let View::SignIn | View::AccessDenied { .. } = view {
        println!("{}", ui::render_view(&view));
        bail!("未授权: {}", view.name());
    }
    app.refresh_quizzes().await?;

    match command {
        Command::Route { hash } => {
            app.navigate(&hash);
            let view = app.view();
            debug!("显示画面: {}", view.name());
            println!("{}", ui::render_view(&view));
            if matches!(app.route(), Route::FeedbackList) {
                println!("{}", ui::render_feedback_list(&app.list_feedback().await?));
            }
        }
        Command::Create {
            pdf,
            title,
            description,
            creator,
            count,
            dry_run,
            script,
            folder,
        } => {
            let bytes = tokio::fs::read(&pdf)
                .await
                .with_context(|| format!("无法读取文件: {}", pdf.display()))?;

            let mut flow = AuthoringFlow::new();
            if let Some(title) = title {
                flow.set_title(title);
            }
            if let Some(description) = description {
                flow.set_description(description);
            }
            if let Some(creator) = creator {
                flow.set_creator(creator);
            }
            flow.set_question_count(count);
            flow.select_file(pdf_extractor::file_name(&pdf), bytes);

            let generated = app.generate(&mut flow).await;
            println!("{}", ui::render_authoring(&flow));
            generated?;

            if !dry_run {
                app.add_quiz(&mut flow).await?;
                println!("{}", ui::render_authoring(&flow));
            }
            if let Some(path) = script {
                let text = flow.generate_script(folder.as_deref())?.to_string();
                tokio::fs::write(&path, text).await?;
                info!("📜 脚本已写入: {}", path.display());
            }
        }
        Command::Take {
            id,
            preview,
            answers,
        } => {
            let route = Route::Quiz { id, preview };
            app.navigate(&route.to_hash());
            let View::TakeQuiz { quiz, preview } = app.view() else {
                println!("{}", ui::render_view(&app.view()));
                bail!("测验不存在");
            };

            let mut session = QuizSession::new(quiz, preview);
            if !preview {
                let tokens: Vec<String> = match answers {
                    Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
                    None => read_answers(session.quiz())?,
                };
                for (position, token) in tokens.iter().enumerate() {
                    if token.is_empty() {
                        continue;
                    }
                    let option = resolve_option(session.quiz(), position, token);
                    session.select(position, option);
                }
                session.submit(app.repository()).await?;
            }
            println!("{}", ui::render_session(&session));
        }
        Command::Delete { id } => {
            app.delete_quiz(&id).await?;
            println!("已删除: {}", id);
        }
        Command::Feedback { kind, content } => {
            let Some(kind) = FeedbackKind::parse(&kind) else {
                bail!("未知的反馈类型: {} (bug | feature)", kind);
            };
            let mut draft = FeedbackDraft::new(kind, content);
            app.submit_feedback(&mut draft).await?;
            println!("感谢反馈！");
        }
        Command::FeedbackList => {
            println!("{}", ui::render_feedback_list(&app.list_feedback().await?));
        }
        Command::Export { id, folder, out } => {
            let Some(quiz) = app.state().get(&id) else {
                bail!("测验不存在: {}", id);
            };
            let script =
                export_form_script(&quiz.items, &quiz.title, &quiz.description, folder.as_deref());
            match out {
                Some(path) => tokio::fs::write(&path, script).await?,
                None => println!("{}", script),
            }
        }
    }
    Ok(())
}

/// 从标准输入逐题读取答案
fn read_answers(quiz: &Quiz) -> Result<Vec<String>> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut answers = Vec::with_capacity(quiz.len());

    for (i, item) in quiz.items.iter().enumerate() {
        println!("Q{}. {}", i + 1, item.question);
        for (j, option) in item.options.iter().enumerate() {
            println!("  {}. {}", j + 1, option);
        }
        match lines.next() {
            Some(line) => answers.push(line?.trim().to_string()),
            None => break,
        }
    }
    Ok(answers)
}

/// 选项序号（从 1 开始）或选项文本
fn resolve_option(quiz: &Quiz, position: usize, token: &str) -> String {
    let options = quiz
        .items
        .get(position)
        .map(|item| item.options.as_slice())
        .unwrap_or_default();
    match token.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => options[n - 1].clone(),
        _ => token.to_string(),
    }
}
