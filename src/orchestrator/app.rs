//! 应用 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：根据配置选择存储后端、确认登录状态
//! 2. **资源所有者**：唯一持有各个网关和应用状态的模块
//! 3. **路由与画面**：根据登录状态、加载状态和路由决定当前画面
//! 4. **向下委托**：具体业务交给 workflow 中的状态机

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, StoreBackend};
use crate::error::{AppResult, PersistenceError};
use crate::infrastructure::{DocumentStore, FirestoreStore, IdentityClient, MemoryStore};
use crate::models::{FeedbackReport, Identity, Quiz};
use crate::orchestrator::route::Route;
use crate::orchestrator::state::AppState;
use crate::orchestrator::view::View;
use crate::services::{
    Access, AccessGate, AuthState, CompletionBackend, LlmService, PdfExtractor, QuizGenerator,
    QuizRepository,
};
use crate::utils::logging;
use crate::workflow::{dashboard, share_url, AuthoringFlow, FeedbackDraft};

/// 应用主结构
pub struct App {
    config: Config,
    repo: QuizRepository,
    generator: QuizGenerator,
    extractor: PdfExtractor,
    gate: AccessGate,
    auth: AuthState,
    state: AppState,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let store: Arc<dyn DocumentStore> = match config.store_backend {
            StoreBackend::Firestore => {
                config.require_firestore()?;
                Arc::new(FirestoreStore::new(
                    config.firebase_project_id.clone(),
                    config.id_token.clone(),
                    timeout,
                )?)
            }
            StoreBackend::Memory => {
                warn!("⚠️ 使用进程内存储，数据不会持久化");
                Arc::new(MemoryStore::new())
            }
        };

        let auth = resolve_auth(&config, timeout).await?;
        let backend: Arc<dyn CompletionBackend> = Arc::new(LlmService::new(&config));

        Ok(Self::with_parts(config, store, backend, auth))
    }

    /// 用给定的组件组装应用（测试和离线运行使用）
    pub fn with_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        backend: Arc<dyn CompletionBackend>,
        auth: AuthState,
    ) -> Self {
        let repo = QuizRepository::new(
            store,
            config.quiz_collection.clone(),
            config.feedback_collection.clone(),
        );
        let gate = AccessGate::new(config.allowed_domain.clone());
        let state = AppState::new(Route::parse(&config.start_hash));

        Self {
            repo,
            generator: QuizGenerator::new(backend),
            extractor: PdfExtractor::new(),
            gate,
            auth,
            state,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &QuizRepository {
        &self.repo
    }

    pub fn route(&self) -> &Route {
        &self.state.route
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// 已授权的当前用户
    pub fn identity(&self) -> Option<&Identity> {
        match self.gate.check(&self.auth) {
            Access::Granted(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn set_auth(&mut self, auth: AuthState) {
        self.auth = auth;
    }

    /// 切换路由
    pub fn navigate(&mut self, hash: &str) -> &Route {
        let route = Route::parse(hash);
        debug!("路由切换: {} → {}", self.state.route, route);
        self.state.route = route;
        &self.state.route
    }

    /// 重新加载全部测验
    ///
    /// 未授权时不加载，返回 0。
    pub async fn refresh_quizzes(&mut self) -> AppResult<usize> {
        if self.identity().is_none() {
            debug!("未授权，跳过测验加载");
            return Ok(0);
        }

        self.state.loading = true;
        let result = self.repo.list_quizzes().await;
        self.state.loading = false;

        let quizzes = result?;
        let total = quizzes.len();
        self.state.replace_quizzes(quizzes);
        logging::log_quizzes_loaded(total);
        Ok(total)
    }

    /// 当前画面
    pub fn view(&self) -> View {
        match self.gate.check(&self.auth) {
            Access::Pending => return View::Loading,
            Access::SignInRequired => return View::SignIn,
            Access::Denied => {
                return View::AccessDenied {
                    domain: self.gate.allowed_domain().to_string(),
                }
            }
            Access::Granted(_) => {}
        }
        if self.state.loading {
            return View::Loading;
        }

        match &self.state.route {
            Route::Create => View::Create,
            Route::Dashboard => View::Dashboard(dashboard::dashboard_rows(
                &self.state.quizzes(),
                self.identity(),
                &self.config.share_base_url,
            )),
            Route::Quiz { id, preview } => match self.state.get(id) {
                Some(quiz) => View::TakeQuiz {
                    quiz: quiz.clone(),
                    preview: *preview,
                },
                None => View::NotFound,
            },
            Route::FeedbackForm => View::FeedbackForm,
            Route::FeedbackList => View::FeedbackList,
            Route::NotFound => View::NotFound,
        }
    }

    /// 抽取 PDF 并生成题目
    pub async fn generate(&self, flow: &mut AuthoringFlow) -> AppResult<()> {
        self.gate.require(&self.auth)?;
        flow.start_generation(&self.extractor, &self.generator).await
    }

    /// 保存制作好的测验并加入已加载集合
    ///
    /// 没有填写创建者时使用当前用户的显示名称。
    pub async fn add_quiz(&mut self, flow: &mut AuthoringFlow) -> AppResult<Quiz> {
        let identity = self.gate.require(&self.auth)?;
        if flow.creator().trim().is_empty() {
            flow.set_creator(identity.name_or_email());
        }

        let quiz = flow.confirm(&self.repo, &self.config.share_base_url).await?;
        self.state.insert(quiz.clone());
        Ok(quiz)
    }

    /// 删除测验，只有创建者可以删除
    pub async fn delete_quiz(&mut self, id: &str) -> AppResult<()> {
        let identity = self.gate.require(&self.auth)?;
        let quiz = self.state.get(id).ok_or_else(|| PersistenceError::NotFound {
            collection: self.config.quiz_collection.clone(),
            id: id.to_string(),
        })?;
        dashboard::check_delete(quiz, Some(identity))?;

        self.repo.delete_quiz(id).await?;
        self.state.remove(id);
        info!("✓ 测验 {} 已从列表移除", id);
        Ok(())
    }

    /// 提交反馈，成功后回到管理菜单
    pub async fn submit_feedback(&mut self, draft: &mut FeedbackDraft) -> AppResult<String> {
        let identity = self.gate.require(&self.auth)?.clone();
        let id = draft.submit(&self.repo, &identity).await?;
        self.navigate(&Route::Dashboard.to_hash());
        Ok(id)
    }

    /// 反馈列表，按提交时间倒序
    pub async fn list_feedback(&self) -> AppResult<Vec<FeedbackReport>> {
        self.gate.require(&self.auth)?;
        self.repo.list_feedback().await
    }

    pub fn share_url(&self, quiz_id: &str) -> String {
        share_url(&self.config.share_base_url, quiz_id, false)
    }
}

/// 确认登录状态
///
/// 有 ID Token 时向身份服务查询；离线模式下可以使用配置中的本地用户。
async fn resolve_auth(config: &Config, timeout: Duration) -> AppResult<AuthState> {
    if let Some(token) = config.id_token.as_deref().filter(|t| !t.is_empty()) {
        let client = IdentityClient::new(config.firebase_api_key.clone(), timeout)?;
        return match client.lookup(token).await {
            Ok(identity) => {
                info!("👤 已登录: {}", identity.name_or_email());
                Ok(AuthState::SignedIn(identity))
            }
            Err(e) => {
                warn!("登录状态无效，按未登录处理: {}", e);
                Ok(AuthState::SignedOut)
            }
        };
    }

    if config.store_backend == StoreBackend::Memory {
        if let Some(email) = config.local_user_email.as_deref() {
            let identity = Identity::new("local", config.local_user_name.as_deref(), Some(email));
            info!("👤 本地用户: {}", identity.name_or_email());
            return Ok(AuthState::SignedIn(identity));
        }
    }

    Ok(AuthState::SignedOut)
}
