//! 应用状态
//!
//! 当前路由和已加载的测验集合，由 `App` 独占持有。

use std::collections::BTreeMap;

use crate::models::Quiz;
use crate::orchestrator::route::Route;

#[derive(Debug, Clone)]
pub struct AppState {
    pub route: Route,
    /// 是否正在加载测验
    pub loading: bool,
    quizzes: BTreeMap<String, Quiz>,
}

impl AppState {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            loading: false,
            quizzes: BTreeMap::new(),
        }
    }

    /// 用新加载的列表替换全部测验
    pub fn replace_quizzes(&mut self, quizzes: Vec<Quiz>) {
        self.quizzes = quizzes.into_iter().map(|q| (q.id.clone(), q)).collect();
    }

    pub fn insert(&mut self, quiz: Quiz) {
        self.quizzes.insert(quiz.id.clone(), quiz);
    }

    pub fn remove(&mut self, id: &str) -> Option<Quiz> {
        self.quizzes.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Quiz> {
        self.quizzes.get(id)
    }

    pub fn quizzes(&self) -> Vec<&Quiz> {
        self.quizzes.values().collect()
    }

    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }
}
