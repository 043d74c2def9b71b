//! 路由
//!
//! 把 URL 中 `#` 之后的部分解析为一个画面。纯函数，没有副作用。

use std::fmt::Display;
use std::sync::OnceLock;

use regex::Regex;

/// 画面路由
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// 制作画面 `#/`
    Create,
    /// 管理菜单 `#/admin`
    Dashboard,
    /// 答题 `#/quiz/<id>`，预览 `#/quiz/<id>?preview=true`
    Quiz { id: String, preview: bool },
    /// 反馈表单 `#/feedback`
    FeedbackForm,
    /// 反馈列表 `#/feedback/list`
    FeedbackList,
    NotFound,
}

fn quiz_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^#/quiz/([^/?#]+)(?:\?(.*))?$").ok())
        .as_ref()
}

impl Route {
    /// 解析 hash
    pub fn parse(hash: &str) -> Self {
        let hash = hash.trim();
        match hash {
            "" | "#" | "#/" => return Route::Create,
            "#/admin" => return Route::Dashboard,
            "#/feedback" => return Route::FeedbackForm,
            "#/feedback/list" => return Route::FeedbackList,
            _ => {}
        }

        match quiz_pattern().and_then(|re| re.captures(hash)) {
            Some(caps) => {
                let id = caps[1].to_string();
                let preview = caps
                    .get(2)
                    .is_some_and(|query| query.as_str().split('&').any(|kv| kv == "preview=true"));
                Route::Quiz { id, preview }
            }
            None => Route::NotFound,
        }
    }

    /// 规范化的 hash
    pub fn to_hash(&self) -> String {
        match self {
            Route::Create => "#/".to_string(),
            Route::Dashboard => "#/admin".to_string(),
            Route::Quiz { id, preview: false } => format!("#/quiz/{}", id),
            Route::Quiz { id, preview: true } => format!("#/quiz/{}?preview=true", id),
            Route::FeedbackForm => "#/feedback".to_string(),
            Route::FeedbackList => "#/feedback/list".to_string(),
            Route::NotFound => "#/404".to_string(),
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(id: &str, preview: bool) -> Route {
        Route::Quiz {
            id: id.to_string(),
            preview,
        }
    }

    #[test]
    fn test_parse_all_variants() {
        assert_eq!(Route::parse(""), Route::Create);
        assert_eq!(Route::parse("#"), Route::Create);
        assert_eq!(Route::parse("#/"), Route::Create);
        assert_eq!(Route::parse("#/admin"), Route::Dashboard);
        assert_eq!(Route::parse("#/quiz/abc123"), quiz("abc123", false));
        assert_eq!(Route::parse("#/quiz/abc123?preview=true"), quiz("abc123", true));
        assert_eq!(Route::parse("#/quiz/abc123?preview=false"), quiz("abc123", false));
        assert_eq!(Route::parse("#/feedback"), Route::FeedbackForm);
        assert_eq!(Route::parse("#/feedback/list"), Route::FeedbackList);
    }

    #[test]
    fn test_unknown_is_not_found() {
        assert_eq!(Route::parse("#/unknown"), Route::NotFound);
        assert_eq!(Route::parse("#/quiz/"), Route::NotFound);
        assert_eq!(Route::parse("#/quiz/a/b"), Route::NotFound);
        assert_eq!(Route::parse("#/admin/"), Route::NotFound);
        assert_eq!(Route::parse("admin"), Route::NotFound);
    }

    #[test]
    fn test_hash_roundtrip() {
        for route in [
            Route::Create,
            Route::Dashboard,
            quiz("x1", false),
            quiz("x1", true),
            Route::FeedbackForm,
            Route::FeedbackList,
        ] {
            assert_eq!(Route::parse(&route.to_hash()), route);
        }
    }
}
